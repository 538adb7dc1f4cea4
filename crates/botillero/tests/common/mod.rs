//! Common test utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use botillero::platform::{
    ChatTransport, CommandContext, Media, NormalizedMessage, SendOptions, SentMessage,
    TransportError,
};
use std::sync::{Arc, Mutex};

pub const GROUP: &str = "120363025@g.us";
pub const SENDER: &str = "56911112222@c.us";

/// Something the bot sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text {
        chat_id: String,
        text: String,
        options: SendOptions,
    },
    Media {
        chat_id: String,
        media: Media,
        options: SendOptions,
    },
}

impl Outgoing {
    pub fn text(&self) -> Option<&str> {
        match self {
            Outgoing::Text { text, .. } => Some(text),
            Outgoing::Media { .. } => None,
        }
    }
}

/// In-memory transport that records everything sent through it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Outgoing>>,
    reactions: Mutex<Vec<(String, String)>>,
    fail_sends: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every send fails with a transport error.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_sends: true,
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<Outgoing> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|o| o.text().map(str::to_string))
            .collect()
    }

    pub fn reactions(&self) -> Vec<(String, String)> {
        self.reactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send("gateway down".into()));
        }
        self.sent.lock().unwrap().push(Outgoing::Text {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            options,
        });
        Ok(SentMessage::default())
    }

    async fn send_media(
        &self,
        chat_id: &str,
        media: &Media,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send("gateway down".into()));
        }
        self.sent.lock().unwrap().push(Outgoing::Media {
            chat_id: chat_id.to_string(),
            media: media.clone(),
            options,
        });
        Ok(SentMessage::default())
    }

    async fn react(&self, message_id: &str, emoji: &str) -> Result<(), TransportError> {
        self.reactions
            .lock()
            .unwrap()
            .push((message_id.to_string(), emoji.to_string()));
        Ok(())
    }

    async fn download_media(&self, _message_id: &str) -> Result<Option<Media>, TransportError> {
        Ok(None)
    }

    async fn media_from_url(&self, url: &str) -> Result<Media, TransportError> {
        Err(TransportError::Media(format!("offline: {}", url)))
    }
}

/// A group message from `SENDER`.
pub fn group_message(text: &str) -> NormalizedMessage {
    let mut message = NormalizedMessage::from_text(GROUP, text);
    message.sender_id = SENDER.to_string();
    message.is_group = true;
    message
}

pub fn context(text: &str, transport: &Arc<RecordingTransport>) -> CommandContext {
    let transport: Arc<dyn ChatTransport> = transport.clone();
    CommandContext::new(group_message(text), transport)
}
