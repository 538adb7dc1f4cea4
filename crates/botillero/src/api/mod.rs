//! Side-channel HTTP API: lets other services post into the group chat.

mod handlers;
mod quota;
mod types;

pub use handlers::*;
pub use quota::NotificationQuota;
pub use types::*;

use crate::platform::ChatTransport;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn ChatTransport>,
    /// Chat that receives notifications. `None` disables delivery.
    pub group_id: Option<String>,
    /// Delivery budget. `None` means unlimited.
    pub quota: Option<Arc<NotificationQuota>>,
}

impl AppState {
    pub fn new(transport: Arc<dyn ChatTransport>, group_id: Option<String>) -> Self {
        Self {
            transport,
            group_id,
            quota: None,
        }
    }

    /// Limit deliveries to `per_minute`; zero leaves them unlimited.
    pub fn with_quota(mut self, per_minute: u32) -> Self {
        self.quota = NotificationQuota::per_minute(per_minute).map(Arc::new);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/send-notification", post(handlers::send_notification))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
