//! Platform adaptation: inbound normalization and outbound capabilities.

mod context;
mod message;
mod transport;

pub use context::{CommandContext, LOADING_EMOJI, STICKER_AUTHOR, STICKER_NAME};
pub use message::{adapt, NormalizedMessage, Platform, QuotedMessage, DEFAULT_SENDER_NAME};
pub use transport::{
    mime_for_path, ChatTransport, Media, SendOptions, SentMessage, StickerMetadata,
    TransportError,
};

#[cfg(test)]
pub use transport::MockChatTransport;
