//! Per-message handle given to command handlers.

use super::message::NormalizedMessage;
use super::transport::{ChatTransport, Media, SendOptions, SentMessage, StickerMetadata, TransportError};
use crate::error::AppResult;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const LOADING_EMOJI: &str = "⏳";
pub const STICKER_AUTHOR: &str = "Botillero";
pub const STICKER_NAME: &str = "Creado por Botillero";

/// The inbound message plus the session it came from.
#[derive(Clone)]
pub struct CommandContext {
    pub message: NormalizedMessage,
    transport: Arc<dyn ChatTransport>,
}

impl CommandContext {
    pub fn new(message: NormalizedMessage, transport: Arc<dyn ChatTransport>) -> Self {
        Self { message, transport }
    }

    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.transport
    }

    /// Reply in the originating chat, quoting the message. Falls back to an
    /// unquoted send once if the quoted one is rejected.
    pub async fn reply(&self, text: &str) -> AppResult<SentMessage> {
        let quoted = SendOptions::quoting(&self.message.id);
        match self
            .transport
            .send_text(&self.message.chat_id, text, quoted)
            .await
        {
            Ok(sent) => Ok(sent),
            Err(e) => {
                warn!(chat = %self.message.chat_id, "Quoted reply failed, sending plain: {}", e);
                Ok(self
                    .transport
                    .send_text(&self.message.chat_id, text, SendOptions::default())
                    .await?)
            }
        }
    }

    /// React to the originating message. Never fails.
    pub async fn react(&self, emoji: &str) -> bool {
        match self.transport.react(&self.message.id, emoji).await {
            Ok(()) => true,
            Err(TransportError::Reaction(e)) => {
                debug!("Reaction suppressed: {}", e);
                false
            }
            Err(e) => {
                warn!("Reaction failed: {}", e);
                false
            }
        }
    }

    pub async fn show_loading(&self) {
        self.react(LOADING_EMOJI).await;
    }

    /// Send to the originating chat without quoting.
    pub async fn send_message(&self, text: &str, options: SendOptions) -> AppResult<SentMessage> {
        Ok(self
            .transport
            .send_text(&self.message.chat_id, text, options)
            .await?)
    }

    /// Send an image from a URL or a local path. `Ok(None)` when the media
    /// cannot be built from the source.
    pub async fn send_image(
        &self,
        path_or_url: &str,
        caption: Option<&str>,
    ) -> AppResult<Option<SentMessage>> {
        let media = if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            self.transport
                .media_from_url(path_or_url)
                .await
                .map_err(|e| e.to_string())
        } else {
            Media::from_path(path_or_url).await.map_err(|e| e.to_string())
        };

        let media = match media {
            Ok(media) => media,
            Err(e) => {
                error!(source = %path_or_url, "Could not build media: {}", e);
                return Ok(None);
            }
        };

        self.send_media(&media, caption).await.map(Some)
    }

    pub async fn send_sticker(&self, media: &Media) -> AppResult<SentMessage> {
        let options = SendOptions {
            sticker: Some(StickerMetadata {
                author: STICKER_AUTHOR.into(),
                name: STICKER_NAME.into(),
            }),
            ..SendOptions::default()
        };
        Ok(self
            .transport
            .send_media(&self.message.chat_id, media, options)
            .await?)
    }

    pub async fn send_media(&self, media: &Media, caption: Option<&str>) -> AppResult<SentMessage> {
        Ok(self
            .transport
            .send_media(&self.message.chat_id, media, SendOptions::with_caption(caption))
            .await?)
    }

    /// Media attached to this message, if any.
    pub async fn download_media(&self) -> AppResult<Option<Media>> {
        if !self.message.has_media {
            return Ok(None);
        }
        Ok(self.transport.download_media(&self.message.id).await?)
    }

    /// Media attached to the quoted message, if any.
    pub async fn download_quoted_media(&self) -> AppResult<Option<Media>> {
        match &self.message.quoted {
            Some(quoted) if quoted.has_media => {
                Ok(self.transport.download_media(&quoted.id).await?)
            }
            _ => Ok(None),
        }
    }
}
