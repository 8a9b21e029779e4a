/*!
 * # Authentication Module
 *
 * Credential-based login for dashboard administrators, issuing JWT
 * access/refresh token pairs. Accounts are created through signup in an
 * INACTIVE state and must be activated out of band; INACTIVE accounts are
 * rejected at login.
 */

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::entities::admin_user::{
    self, Entity as AdminUserEntity, STATUS_ACTIVE, STATUS_INACTIVE,
};
use crate::events::{Event, EventSender};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (admin user ID)
    pub name: Option<String>, // Admin's display name
    pub email: Option<String>,
    pub role: Option<String>,
    pub jti: String, // JWT ID (unique identifier for this token)
    pub iat: i64,    // Issued at time
    pub exp: i64,    // Expiration time
    pub nbf: i64,    // Not valid before time
    pub iss: String, // Issuer
    pub aud: String, // Audience
}

/// Authenticated admin extracted from a validated JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the admin has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    /// Display name to stamp on records this admin touches
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
            refresh_token_expiration,
        }
    }
}

/// Authentication service that handles signup, login and token validation
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl AuthService {
    pub fn new(
        config: AuthConfig,
        db: Arc<DatabaseConnection>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            config,
            db,
            event_sender,
        }
    }

    /// Register a new admin account. Accounts start INACTIVE.
    pub async fn signup(&self, request: SignupRequest) -> Result<Uuid, AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidInput(flatten_validation_errors(&e)))?;

        let dob = NaiveDate::parse_from_str(&request.dob, "%Y-%m-%d")
            .map_err(|_| AuthError::InvalidInput("dob: Invalid date format".to_string()))?;

        let existing = AdminUserEntity::find()
            .filter(admin_user::Column::Email.eq(request.email.clone()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let now = Utc::now();
        let admin_id = Uuid::new_v4();
        let model = admin_user::ActiveModel {
            id: Set(admin_id),
            email: Set(request.email),
            password_hash: Set(password_hash),
            full_name: Set(request.full_name),
            phone_number: Set(request.phone_number),
            date_of_birth: Set(dob),
            status: Set(STATUS_INACTIVE.to_string()),
            role: Set("ADMIN".to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        model
            .insert(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        info!(admin_id = %admin_id, "admin account registered (inactive)");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::AdminSignedUp(admin_id)).await {
                warn!(error = %e, admin_id = %admin_id, "Failed to send admin signup event");
            }
        }

        Ok(admin_id)
    }

    /// Verify credentials and issue a token pair. Inactive accounts are
    /// rejected before any token is produced.
    pub async fn login(&self, credentials: LoginRequest) -> Result<TokenPair, AuthError> {
        let user = AdminUserEntity::find()
            .filter(admin_user::Column::Email.eq(credentials.email.clone()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        if user.status != STATUS_ACTIVE {
            return Err(AuthError::InactiveAccount);
        }

        self.generate_token(&user).await
    }

    /// Generate a JWT access/refresh pair for an admin user
    pub async fn generate_token(&self, user: &admin_user::Model) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let access_claims = Claims {
            sub: user.id.to_string(),
            name: Some(user.full_name.clone()),
            email: Some(user.email.clone()),
            role: Some(user.role.clone()),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // Refresh token carries minimal data
        let refresh_claims = Claims {
            sub: user.id.to_string(),
            name: None,
            email: None,
            role: None,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &access_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        let refresh_token = encode(
            &Header::new(Algorithm::HS256),
            &refresh_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
            refresh_expires_in: self.config.refresh_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }

    /// Rotate an access/refresh pair using a still-valid refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.validate_token(refresh_token).await?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let user = AdminUserEntity::find_by_id(user_id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if user.status != STATUS_ACTIVE {
            return Err(AuthError::InactiveAccount);
        }

        self.generate_token(&user).await
    }
}

/// Token pair response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Login credentials
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup payload for new admin accounts
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 10, max = 10, message = "Phone number must be 10 digits"))]
    pub phone_number: String,
    pub dob: String,
}

/// Refresh token request
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

fn flatten_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error.message.as_ref().unwrap_or(&"Invalid value".into())
                )
            })
        })
        .next()
        .unwrap_or_else(|| "Validation failed".to_string())
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("inactive")]
    InactiveAccount,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("User already exists")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match &self {
            Self::MissingAuth => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::InvalidCredentials
            | Self::InactiveAccount
            | Self::InvalidToken
            | Self::TokenExpired => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::UserExists | Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::TokenCreation(_)
            | Self::HashError(_)
            | Self::DatabaseError(_)
            | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "status": "error",
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Authentication middleware that validates the Bearer token and inserts the
/// resulting [`AuthUser`] into request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
async fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if let Some(token) = auth_value.strip_prefix("Bearer ") {
                let claims = auth_service.validate_token(token.trim()).await?;

                return Ok(AuthUser {
                    user_id: claims.sub,
                    name: claims.name,
                    email: claims.email,
                    role: claims.role,
                    token_id: claims.jti,
                });
            }
        }
    }

    Err(AuthError::MissingAuth)
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/signup", axum::routing::post(signup_handler))
        .route("/login", axum::routing::post(login_handler))
        .route("/refresh", axum::routing::post(refresh_token_handler))
        .layer(DefaultBodyLimit::max(1024 * 64)) // 64KB limit
}

/// Signup handler
pub async fn signup_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    auth_service.signup(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "Sign up successfully",
        })),
    ))
}

/// Login handler
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let token_pair = auth_service.login(credentials).await?;
    Ok(Json(token_pair))
}

/// Refresh token handler
pub async fn refresh_token_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(refresh_request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let token_pair = auth_service
        .refresh_token(&refresh_request.refresh_token)
        .await?;

    Ok(Json(token_pair))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        let config = AuthConfig::new(
            "unit_test_secret_key_with_enough_entropy_0a1b2c3d".to_string(),
            "promo-orders-api".to_string(),
            "promo-orders-admin".to_string(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        );
        AuthService::new(
            config,
            Arc::new(DatabaseConnection::Disconnected),
            None,
        )
    }

    fn sample_admin() -> admin_user::Model {
        admin_user::Model {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            full_name: "Admin One".to_string(),
            phone_number: "0201234567".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
            status: STATUS_ACTIVE.to_string(),
            role: "ADMIN".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn token_round_trip_preserves_claims() {
        let service = test_service();
        let admin = sample_admin();

        let pair = service.generate_token(&admin).await.unwrap();
        let claims = service.validate_token(&pair.access_token).await.unwrap();

        assert_eq!(claims.sub, admin.id.to_string());
        assert_eq!(claims.name.as_deref(), Some("Admin One"));
        assert_eq!(claims.role.as_deref(), Some("ADMIN"));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let service = test_service();
        let admin = sample_admin();

        let pair = service.generate_token(&admin).await.unwrap();
        let mut tampered = pair.access_token.clone();
        tampered.push('x');

        assert!(matches!(
            service.validate_token(&tampered).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn signup_request_validation() {
        let valid = SignupRequest {
            email: "new@example.com".to_string(),
            password: "secret1".to_string(),
            full_name: "New Admin".to_string(),
            phone_number: "0209876543".to_string(),
            dob: "1992-11-20".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = SignupRequest {
            email: "not-an-email".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            password: "short".to_string(),
            ..valid_clone(&valid)
        };
        assert!(short_password.validate().is_err());

        let bad_phone = SignupRequest {
            phone_number: "12345".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_phone.validate().is_err());
    }

    fn valid_clone(req: &SignupRequest) -> SignupRequest {
        SignupRequest {
            email: req.email.clone(),
            password: req.password.clone(),
            full_name: req.full_name.clone(),
            phone_number: req.phone_number.clone(),
            dob: req.dob.clone(),
        }
    }
}
