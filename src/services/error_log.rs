use crate::entities::error_log;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Best-effort recorder for failed requests. Writing the record must never
/// affect the response to the caller, so failures here are logged and
/// swallowed.
#[derive(Clone)]
pub struct ErrorLogService {
    db_pool: Arc<DatabaseConnection>,
}

impl ErrorLogService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    pub async fn record(&self, endpoint: &str, request_body: &str, error_message: &str) {
        let entry = error_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            endpoint: Set(endpoint.to_string()),
            request_body: Set(request_body.to_string()),
            error_message: Set(error_message.to_string()),
            occurred_at: Set(Utc::now()),
        };

        if let Err(e) = entry.insert(&*self.db_pool).await {
            warn!(error = %e, endpoint = %endpoint, "Failed to write error log entry");
        }
    }
}
