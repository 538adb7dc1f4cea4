//! WhatsApp gateway API types.

use serde::{Deserialize, Serialize};

/// Incoming WhatsApp message as delivered by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    /// Serialized message id (e.g. `false_56912345678@c.us_3EB0...`).
    #[serde(default)]
    pub id: String,
    /// Originating chat (`...@c.us` for direct chats, `...@g.us` for groups).
    pub from: Option<String>,
    /// Sender inside a group chat; absent in direct chats.
    pub author: Option<String>,
    /// Push name of the sender.
    pub notify_name: Option<String>,
    #[serde(default)]
    pub body: String,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub has_media: bool,
    /// Message type (`chat`, `image`, `video`, `sticker`, `audio`, ...).
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub is_animated: bool,
    #[serde(default)]
    pub mentioned_ids: Vec<String>,
    pub quoted_msg: Option<QuotedMessageInfo>,
}

/// Message referenced by a reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedMessageInfo {
    #[serde(default)]
    pub id: String,
    pub from: Option<String>,
    pub author: Option<String>,
    pub notify_name: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub has_media: bool,
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub is_animated: bool,
}

fn default_message_type() -> String {
    "chat".into()
}

/// Base64 encoded media attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub mimetype: String,
    /// Base64 encoded bytes.
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Outgoing text message request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTextRequest {
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_message_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
}

/// Outgoing media message request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaRequest {
    pub chat_id: String,
    pub media: MediaPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_message_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    pub send_media_as_sticker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker_author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker_name: Option<String>,
}

/// Reaction request.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionRequest {
    pub emoji: String,
}

/// Send message response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageResponse {
    pub id: Option<String>,
}

/// Gateway session status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// `CONNECTED`, `PAIRING`, `DISCONNECTED`, ...
    pub state: String,
    /// Own WhatsApp id once paired.
    pub me: Option<String>,
}

impl SessionStatus {
    pub fn is_connected(&self) -> bool {
        self.state.eq_ignore_ascii_case("connected")
    }
}
