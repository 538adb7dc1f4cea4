//! HTTP request handlers.

use super::types::{HealthResponse, NotificationRequest, StatusBody};
use super::AppState;
use crate::error::ApiError;
use crate::platform::SendOptions;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::{error, info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        notifications_enabled: state.group_id.is_some(),
    })
}

/// Forward a notification to the configured group.
pub async fn send_notification(
    State(state): State<AppState>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected notification body: {}", rejection);
            return Err(ApiError::MissingMessage);
        }
    };

    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or(ApiError::MissingMessage)?;
    let group_id = state.group_id.as_deref().ok_or(ApiError::NoTarget)?;
    if let Some(quota) = &state.quota {
        quota.acquire(group_id)?;
    }

    state
        .transport
        .send_text(group_id, &message, SendOptions::default())
        .await
        .map_err(|e| {
            error!(group = %group_id, "Notification delivery failed: {}", e);
            ApiError::Delivery(e.to_string())
        })?;

    info!(group = %group_id, "Notification sent");
    Ok(Json(StatusBody::ok("Notificación enviada.")))
}
