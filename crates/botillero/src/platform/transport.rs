//! Outbound side of the chat platform.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use thiserror::Error;
use tracing::instrument;
use whatsapp_client::{
    MediaPayload, SendMediaRequest, SendMessageResponse, SendTextRequest, WhatsAppClient,
    WhatsAppError,
};

/// Errors surfaced by a chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Reaction send error: {0}")]
    Reaction(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<WhatsAppError> for TransportError {
    fn from(e: WhatsAppError) -> Self {
        match e {
            WhatsAppError::ReactionFailed(msg) => TransportError::Reaction(msg),
            WhatsAppError::SendFailed(msg) => TransportError::Send(msg),
            WhatsAppError::MediaUnavailable(msg) => TransportError::Media(msg),
            other => TransportError::Other(other.to_string()),
        }
    }
}

/// Sticker pack metadata shown by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickerMetadata {
    pub author: String,
    pub name: String,
}

/// Per-send options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub quoted_message_id: Option<String>,
    pub caption: Option<String>,
    pub mentions: Vec<String>,
    /// Deliver media as a sticker.
    pub sticker: Option<StickerMetadata>,
}

impl SendOptions {
    pub fn quoting(message_id: impl Into<String>) -> Self {
        Self {
            quoted_message_id: Some(message_id.into()),
            ..Self::default()
        }
    }

    pub fn with_caption(caption: Option<&str>) -> Self {
        Self {
            caption: caption.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Handle to a message the transport accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentMessage {
    pub id: Option<String>,
}

impl From<SendMessageResponse> for SentMessage {
    fn from(response: SendMessageResponse) -> Self {
        Self { id: response.id }
    }
}

/// Media attachment, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub mimetype: String,
    pub data: String,
    pub filename: Option<String>,
}

impl Media {
    pub fn from_bytes(mimetype: impl Into<String>, bytes: &[u8], filename: Option<String>) -> Self {
        Self {
            mimetype: mimetype.into(),
            data: STANDARD.encode(bytes),
            filename,
        }
    }

    /// Read a local file, guessing the mime type from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Ok(Self::from_bytes(mime_for_path(path), &bytes, filename))
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }

    pub fn is_video(&self) -> bool {
        self.mimetype.starts_with("video/") || self.mimetype == "image/gif"
    }
}

impl From<MediaPayload> for Media {
    fn from(payload: MediaPayload) -> Self {
        Self {
            mimetype: payload.mimetype,
            data: payload.data,
            filename: payload.filename,
        }
    }
}

impl From<Media> for MediaPayload {
    fn from(media: Media) -> Self {
        Self {
            mimetype: media.mimetype,
            data: media.data,
            filename: media.filename,
        }
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// Capabilities the bot needs from a chat session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError>;

    async fn send_media(
        &self,
        chat_id: &str,
        media: &Media,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError>;

    async fn react(&self, message_id: &str, emoji: &str) -> Result<(), TransportError>;

    /// Media attached to a message, `None` when the gateway no longer has it.
    async fn download_media(&self, message_id: &str) -> Result<Option<Media>, TransportError>;

    /// Fetch a remote file as media.
    async fn media_from_url(&self, url: &str) -> Result<Media, TransportError>;
}

#[async_trait]
impl ChatTransport for WhatsAppClient {
    #[instrument(skip(self, text, options))]
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        let request = SendTextRequest {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            quoted_message_id: options.quoted_message_id,
            mentions: options.mentions,
        };
        Ok(WhatsAppClient::send_text(self, &request).await?.into())
    }

    #[instrument(skip(self, media, options), fields(mimetype = %media.mimetype))]
    async fn send_media(
        &self,
        chat_id: &str,
        media: &Media,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        let (author, name) = match options.sticker {
            Some(sticker) => (Some(sticker.author), Some(sticker.name)),
            None => (None, None),
        };
        let request = SendMediaRequest {
            chat_id: chat_id.to_string(),
            media: media.clone().into(),
            caption: options.caption,
            quoted_message_id: options.quoted_message_id,
            mentions: options.mentions,
            send_media_as_sticker: author.is_some(),
            sticker_author: author,
            sticker_name: name,
        };
        Ok(WhatsAppClient::send_media(self, &request).await?.into())
    }

    async fn react(&self, message_id: &str, emoji: &str) -> Result<(), TransportError> {
        Ok(WhatsAppClient::react(self, message_id, emoji).await?)
    }

    async fn download_media(&self, message_id: &str) -> Result<Option<Media>, TransportError> {
        Ok(WhatsAppClient::download_media(self, message_id)
            .await?
            .map(Media::from))
    }

    async fn media_from_url(&self, url: &str) -> Result<Media, TransportError> {
        Ok(self.fetch_media(url).await?.into())
    }
}
