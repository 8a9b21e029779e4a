use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use axum::http::{header, Method, Request, StatusCode};
use axum::{body::Body, Router};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use promo_orders_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{admin_user, product, promo_event, province, shop},
    events::{self, EventSender},
    handlers::AppServices,
    rate_limiter::{PathPolicy, RateLimitBackend, RateLimitConfig, RateLimitLayer},
    AppState,
};

/// Test harness: the real router over a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    #[allow(dead_code)]
    pub auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a test application with default (generous) rate limits.
    pub async fn new() -> Self {
        Self::with_order_rate_limit(1_000).await
    }

    /// Construct a test application with a specific order-submission limit,
    /// for exercising the 429 path.
    pub async fn with_order_rate_limit(order_limit: u32) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "redis://127.0.0.1:6379".to_string(),
            "integration_test_secret_key_with_plenty_of_entropy_42".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single pooled connection keeps the in-memory schema alive.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let db_arc = Arc::new(pool);
        let redis_client =
            Arc::new(redis::Client::open(cfg.redis_url.clone()).expect("redis client"));

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
            Duration::from_secs(cfg.refresh_token_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(
            auth_cfg,
            db_arc.clone(),
            Some(event_sender.clone()),
        ));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            auth_service.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg.clone(),
            event_sender,
            services,
            redis: redis_client,
        };

        let rate_limit = RateLimitLayer::new(
            RateLimitConfig {
                requests_per_window: 10_000,
                window_duration: Duration::from_secs(60),
                enable_headers: true,
            },
            RateLimitBackend::InMemory,
        )
        .with_policies(vec![PathPolicy {
            prefix: "/api/v1/orders".to_string(),
            method: Some(Method::POST),
            requests_per_window: order_limit,
            window_duration: Duration::from_secs(60),
        }]);

        let router = Router::new()
            .nest("/api/v1", promo_orders_api::api_v1_routes())
            .nest(
                "/auth",
                promo_orders_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(axum::middleware::from_fn_with_state(
                auth_service.clone(),
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: axum::http::Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone())
            .layer(rate_limit);

        Self {
            router,
            state,
            auth_service,
            _event_task: event_task,
        }
    }

    /// Issue a request against the router and return the raw response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_with_token(method, path, body, None).await
    }

    /// Issue a request with a Bearer token attached.
    #[allow(dead_code)]
    pub async fn request_authenticated(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: &str,
    ) -> axum::response::Response {
        self.request_with_token(method, path, body, Some(token))
            .await
    }

    async fn request_with_token(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    /// Read and parse a JSON response body.
    pub async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        serde_json::from_slice(&bytes).expect("parse response body")
    }

    /// Assert status and return the parsed body in one step.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let response = self.request(method, path, body).await;
        assert_eq!(response.status(), expected);
        Self::read_json(response).await
    }

    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        crate_qty: i32,
        free_qty: i32,
        crate_price: Decimal,
    ) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            product_price: Set(price),
            crate_qty_per_product: Set(crate_qty),
            promotion_free_qty: Set(free_qty),
            crate_price: Set(crate_price),
            images: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_shop(&self, code: &str, name: &str, active: bool) -> shop::Model {
        shop::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            owner_name: Set("Somchai".to_string()),
            owner_phone: Set("02099900011".to_string()),
            province: Set("Vientiane".to_string()),
            district: Set("Chanthabouly".to_string()),
            village: Set("Ban Mixay".to_string()),
            activated_at: Set(active.then(Utc::now)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed shop")
    }

    pub async fn seed_event(&self, name: &str, active: bool) -> promo_event::Model {
        promo_event::ActiveModel {
            name: Set(name.to_string()),
            active: Set(active),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed event")
    }

    #[allow(dead_code)]
    pub async fn seed_province(&self, code: &str, name: &str, deleted: bool) -> province::Model {
        province::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            deleted: Set(deleted),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed province")
    }

    #[allow(dead_code)]
    pub async fn seed_district(
        &self,
        province_id: i32,
        name: &str,
        deleted: bool,
    ) -> promo_orders_api::entities::district::Model {
        promo_orders_api::entities::district::ActiveModel {
            province_id: Set(province_id),
            name: Set(name.to_string()),
            deleted: Set(deleted),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed district")
    }

    /// Insert an admin account directly, bypassing signup, so login tests can
    /// control the stored status.
    #[allow(dead_code)]
    pub async fn seed_admin(
        &self,
        email: &str,
        password: &str,
        status: &str,
    ) -> admin_user::Model {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .expect("hash password")
            .to_string();

        admin_user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            full_name: Set("Test Admin".to_string()),
            phone_number: Set("0205550000".to_string()),
            date_of_birth: Set(NaiveDate::from_ymd_opt(1988, 2, 2).unwrap()),
            status: Set(status.to_string()),
            role: Set("ADMIN".to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed admin")
    }

    /// Log an admin in and return the access token.
    #[allow(dead_code)]
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body = self
            .request_json(
                Method::POST,
                "/auth/login",
                Some(serde_json::json!({"email": email, "password": password})),
                StatusCode::OK,
            )
            .await;
        body["access_token"]
            .as_str()
            .expect("access token in login response")
            .to_string()
    }
}

/// A complete, valid order payload for the given shop/event/product.
#[allow(dead_code)]
pub fn order_payload(shop_id: i32, event_id: i32, product_id: i32, qty: i32) -> Value {
    serde_json::json!({
        "user": {
            "shop_id": shop_id,
            "event_id": event_id,
            "full_name": "Khamla Vong",
            "phone_number": "02055512345",
            "dob": "1990-01-01",
            "gender": "FEMALE",
            "province": "Vientiane",
            "district": "Chanthabouly",
            "village": "Ban Mixay",
            "accept_terms": true
        },
        "order_details": [
            {"product_id": product_id, "order_detail_qty": qty}
        ]
    })
}
