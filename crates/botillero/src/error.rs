//! Application error types.

use crate::api::StatusBody;
use crate::platform::TransportError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("WhatsApp error: {0}")]
    WhatsApp(#[from] whatsapp_client::WhatsAppError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Service error: {0}")]
    Service(#[from] bot_services::ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Command failed: {0}")]
    Command(String),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// Errors returned by the notification API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No se recibió mensaje.")]
    MissingMessage,

    #[error("No hay un grupo configurado para notificaciones.")]
    NoTarget,

    #[error("No se pudo enviar la notificación: {0}")]
    Delivery(String),

    #[error("Demasiadas notificaciones, intenta de nuevo en {retry_after_secs} segundos.")]
    RateLimitExceeded { retry_after_secs: u64 },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingMessage => StatusCode::BAD_REQUEST,
            ApiError::NoTarget => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Delivery(_) => StatusCode::BAD_GATEWAY,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        };

        let body = Json(StatusBody {
            status: "error".to_string(),
            message: self.to_string(),
        });

        match self {
            ApiError::RateLimitExceeded { retry_after_secs } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}
