//! Routes each normalized message to at most one responder, after the
//! keyword reactions have had their look at it.

mod countdown;
mod keywords;
mod mention;
mod replies;
mod soundboard;

pub use countdown::{countdown_message, COUNTDOWN_COMMANDS};
pub use keywords::{KeywordRule, KeywordTable};
pub use mention::{is_mention, MentionResponder, TRIGGERS};
pub use replies::static_reply;
pub use soundboard::Soundboard;

use crate::commands::{invoke, CommandTable};
use crate::error::AppResult;
use crate::platform::{CommandContext, Media, SendOptions};
use chrono::{FixedOffset, Utc};
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

pub const NO_COMMAND_REPLY: &str = "¿Y el comando? Escribe `!menu` pa' ver la lista.";
pub const NOT_FOUND_REPLY: &str = "Ese comando no existe, wn. Prueba con `!menu`.";
pub const FAILURE_REPLY: &str = "Ocurrió un error inesperado al procesar tu comando.";

const ACKNOWLEDGEMENTS: &[&str] = &["Al tiro", "Estamos en eso"];

/// Which path a message took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignored,
    Mention,
    NoCommand,
    Countdown,
    StaticReply,
    Sound(String),
    Command(String),
    NotFound(String),
    Failed(String),
}

pub struct Router {
    table: CommandTable,
    keywords: KeywordTable,
    mentions: MentionResponder,
    sounds: Soundboard,
    offset: FixedOffset,
    acknowledge: bool,
}

impl Router {
    pub fn new(table: CommandTable, sounds: Soundboard, offset: FixedOffset) -> Self {
        Self {
            table,
            keywords: KeywordTable::default(),
            mentions: MentionResponder::default(),
            sounds,
            offset,
            acknowledge: false,
        }
    }

    pub fn with_keywords(mut self, keywords: KeywordTable) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_mentions(mut self, mentions: MentionResponder) -> Self {
        self.mentions = mentions;
        self
    }

    /// Send "Al tiro @name" before running table commands.
    pub fn with_acknowledgements(mut self, enabled: bool) -> Self {
        self.acknowledge = enabled;
        self
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Handle one message. Never fails: errors become a single generic reply.
    ///
    /// Keyword reactions fire first and do not stop the message from being
    /// routed as usual.
    pub async fn dispatch(&self, ctx: &CommandContext) -> Route {
        if let Err(e) = self.keywords.respond(ctx).await {
            warn!(chat = %ctx.message.chat_id, "Keyword reply failed: {}", e);
        }

        let label = ctx.message.command.clone().unwrap_or_default();

        match self.route(ctx).await {
            Ok(route) => {
                debug!(chat = %ctx.message.chat_id, ?route, "Message routed");
                route
            }
            Err(e) => {
                error!(command = %label, chat = %ctx.message.chat_id, "Command failed: {}", e);
                if let Err(e) = ctx.reply(FAILURE_REPLY).await {
                    error!("Failed to send error reply: {}", e);
                }
                Route::Failed(label)
            }
        }
    }

    async fn route(&self, ctx: &CommandContext) -> AppResult<Route> {
        let message = &ctx.message;

        if is_mention(&message.clean_text) {
            let text = self.mentions.respond(&message.mention_tag()).await;
            let options = SendOptions {
                mentions: vec![message.sender_id.clone()],
                ..SendOptions::quoting(&message.id)
            };
            ctx.send_message(&text, options).await?;
            return Ok(Route::Mention);
        }

        let Some(command) = message.command.as_deref() else {
            return Ok(Route::Ignored);
        };
        info!(
            platform = %message.platform,
            chat = %message.chat_id,
            "Command received: {:?}",
            command
        );

        if command.is_empty() {
            ctx.reply(NO_COMMAND_REPLY).await?;
            return Ok(Route::NoCommand);
        }

        if COUNTDOWN_COMMANDS.contains(&command) {
            let now = Utc::now().with_timezone(&self.offset);
            if let Some(text) = countdown_message(command, now) {
                ctx.reply(&text).await?;
                return Ok(Route::Countdown);
            }
        }

        if let Some(text) = static_reply(command) {
            ctx.reply(&text).await?;
            return Ok(Route::StaticReply);
        }

        if let Some(path) = self.sounds.find(command).await {
            let media = Media::from_path(&path).await?;
            ctx.send_media(&media, None).await?;
            return Ok(Route::Sound(command.to_string()));
        }

        let Some(entry) = self.table.resolve(command) else {
            ctx.reply(NOT_FOUND_REPLY).await?;
            return Ok(Route::NotFound(command.to_string()));
        };

        if entry.shows_loading {
            ctx.show_loading().await;
        }
        if self.acknowledge {
            self.send_acknowledgement(ctx).await;
        }

        invoke(entry.handler.as_ref(), ctx).await?;
        Ok(Route::Command(entry.name.clone()))
    }

    async fn send_acknowledgement(&self, ctx: &CommandContext) {
        let Some(prefix) = ACKNOWLEDGEMENTS.choose(&mut rand::thread_rng()) else {
            return;
        };
        let text = format!("{} {}", prefix, ctx.message.mention_tag());
        let options = SendOptions {
            mentions: vec![ctx.message.sender_id.clone()],
            ..SendOptions::default()
        };
        if let Err(e) = ctx.send_message(&text, options).await {
            warn!("Acknowledgement failed: {}", e);
        }
    }
}
