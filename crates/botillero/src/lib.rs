//! Botillero - a WhatsApp group bot.
//!
//! Messages arrive from a WhatsApp Web gateway, are normalized, parsed for a
//! `!`/`/` command and routed to one handler. A small HTTP API lets other
//! services post notifications into a configured group.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod parser;
pub mod platform;
pub mod router;

pub use commands::{builtin_table, CommandHandler, CommandTable, Reply, Services};
pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use platform::{adapt, ChatTransport, CommandContext, NormalizedMessage};
pub use router::{Route, Router, Soundboard};
