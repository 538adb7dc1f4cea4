//! Service errors.

use thiserror::Error;

/// Errors that can occur while talking to an external service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Operation timed out.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid input from the chat user.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Socket or process I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Service is not configured (missing API key, etc.).
    #[error("Service not configured: {0}")]
    NotConfigured(String),

    /// External service returned an error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Helper script exited unsuccessfully.
    #[error("Script {script} failed: {message}")]
    Script { script: String, message: String },
}
