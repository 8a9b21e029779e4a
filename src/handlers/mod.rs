pub mod catalog;
pub mod orders;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::orders::OrderService>,
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub error_log: Arc<crate::services::error_log::ErrorLogService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            Some(event_sender),
        ));
        let catalog = Arc::new(crate::services::catalog::CatalogService::new(
            db_pool.clone(),
        ));
        let error_log = Arc::new(crate::services::error_log::ErrorLogService::new(db_pool));

        Self {
            orders,
            catalog,
            error_log,
            auth: auth_service,
        }
    }
}
