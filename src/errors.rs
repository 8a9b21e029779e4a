use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use sea_orm::SqlErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always the literal "error"
    #[schema(example = "error")]
    pub status: String,
    /// Human-readable error description
    #[schema(example = "Order not found")]
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error")]
    DatabaseError(#[source] DbErr),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Unauthorized")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let message = err
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
            .unwrap_or_else(|| "Validation failed".to_string());
        ServiceError::ValidationError(message)
    }
}

/// Store errors are mapped from a small fixed set of recognizable conditions
/// to HTTP status/message pairs; anything unrecognized falls back to a
/// generic 500.
impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict("Unique constraint error".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ServiceError::BadRequest("Foreign key constraint failed".to_string())
            }
            _ => match err {
                DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
                    ServiceError::NotFound("Record not found".to_string())
                }
                other => ServiceError::DatabaseError(other),
            },
        }
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Returns the message suitable for HTTP responses. Internal errors get
    /// a generic message so implementation details never leak to callers.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            Self::Unauthorized(msg) => {
                if msg.is_empty() {
                    "Unauthorized".to_string()
                } else {
                    msg.clone()
                }
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.response_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn db_errors_classified_into_taxonomy() {
        let missing: ServiceError = DbErr::RecordNotFound("orders".into()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let stale: ServiceError = DbErr::RecordNotUpdated.into();
        assert_eq!(stale.status_code(), StatusCode::NOT_FOUND);

        let unknown: ServiceError = DbErr::Custom("boom".into()).into();
        assert_eq!(unknown.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unknown.response_message(), "Database error");
    }

    #[tokio::test]
    async fn error_response_uses_wire_shape() {
        let response = ServiceError::NotFound("Order not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.status, "error");
        assert_eq!(payload.message, "Order not found");
    }
}
