//! WhatsApp gateway client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhatsAppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Session not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The gateway refused or failed to deliver a reaction.
    #[error("Reaction send error: {0}")]
    ReactionFailed(String),

    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),
}
