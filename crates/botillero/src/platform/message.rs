//! Normalized inbound message.

use crate::parser::{parse, strip_mentions};
use std::fmt;
use whatsapp_client::IncomingMessage;

pub const DEFAULT_SENDER_NAME: &str = "Usuario";

/// Transport a message arrived on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    #[default]
    WhatsApp,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::WhatsApp => write!(f, "whatsapp"),
        }
    }
}

/// Message referenced by a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotedMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub has_media: bool,
    pub media_type: String,
    pub is_animated: bool,
}

/// Platform independent view of an inbound chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub platform: Platform,
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: String,
    /// Raw message body.
    pub text: String,
    /// Body with mention tokens removed; commands and triggers are read from here.
    pub clean_text: String,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub is_group: bool,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub mentioned_ids: Vec<String>,
    pub has_media: bool,
    pub media_type: String,
    pub is_animated: bool,
    pub quoted: Option<QuotedMessage>,
}

impl NormalizedMessage {
    /// Plain text message in a direct chat.
    pub fn from_text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        let chat_id = chat_id.into();
        let text = text.into();
        let parsed = parse(&text);
        Self {
            id: format!("false_{}_TEST", chat_id),
            sender_id: chat_id.clone(),
            sender_name: DEFAULT_SENDER_NAME.into(),
            chat_id,
            clean_text: text.clone(),
            text,
            command: parsed.command,
            args: parsed.args,
            media_type: "chat".into(),
            ..Self::default()
        }
    }

    pub fn has_prefix(&self) -> bool {
        self.command.is_some()
    }

    /// Arguments joined back into one string.
    pub fn args_text(&self) -> String {
        self.args.join(" ")
    }

    /// `@<number>` tag that renders as a mention of the sender.
    pub fn mention_tag(&self) -> String {
        let user = self.sender_id.split('@').next().unwrap_or(&self.sender_id);
        format!("@{}", user)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Convert a gateway message. Returns `None` for events the bot should never
/// look at: no originating chat, sent by the bot itself, or empty.
pub fn adapt(raw: &IncomingMessage) -> Option<NormalizedMessage> {
    let chat_id = non_empty(raw.from.as_deref())?.to_string();
    if raw.from_me {
        return None;
    }
    if raw.body.trim().is_empty() && !raw.has_media {
        return None;
    }

    let clean_text = if raw.mentioned_ids.is_empty() {
        raw.body.clone()
    } else {
        strip_mentions(&raw.body)
    };
    let parsed = parse(&clean_text);

    let quoted = raw.quoted_msg.as_ref().map(|q| QuotedMessage {
        id: q.id.clone(),
        sender_id: non_empty(q.author.as_deref())
            .or(non_empty(q.from.as_deref()))
            .unwrap_or_default()
            .to_string(),
        sender_name: non_empty(q.notify_name.as_deref())
            .unwrap_or(DEFAULT_SENDER_NAME)
            .to_string(),
        text: q.body.clone(),
        has_media: q.has_media,
        media_type: q.message_type.clone(),
        is_animated: q.is_animated,
    });

    Some(NormalizedMessage {
        platform: Platform::WhatsApp,
        id: raw.id.clone(),
        sender_id: non_empty(raw.author.as_deref())
            .unwrap_or(&chat_id)
            .to_string(),
        sender_name: non_empty(raw.notify_name.as_deref())
            .unwrap_or(DEFAULT_SENDER_NAME)
            .to_string(),
        is_group: raw.is_group || chat_id.ends_with("@g.us"),
        chat_id,
        text: raw.body.clone(),
        clean_text,
        command: parsed.command,
        args: parsed.args,
        timestamp: raw.timestamp,
        mentioned_ids: raw.mentioned_ids.clone(),
        has_media: raw.has_media,
        media_type: raw.message_type.clone(),
        is_animated: raw.is_animated,
        quoted,
    })
}
