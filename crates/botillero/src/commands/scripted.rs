//! Commands answered by helper scripts.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::platform::CommandContext;
use async_trait::async_trait;
use bot_services::{script_error, ScriptRunner};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// A command whose reply is whatever the script prints.
pub struct ScriptCommand {
    name: &'static str,
    script: &'static str,
    aliases: &'static [&'static str],
    loading: bool,
    usage: Option<&'static str>,
    empty_reply: Option<&'static str>,
    runner: Arc<ScriptRunner>,
}

impl ScriptCommand {
    pub fn new(name: &'static str, script: &'static str, runner: Arc<ScriptRunner>) -> Self {
        Self {
            name,
            script,
            aliases: &[],
            loading: false,
            usage: None,
            empty_reply: None,
            runner,
        }
    }

    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_loading(mut self) -> Self {
        self.loading = true;
        self
    }

    /// Answer with `usage` instead of running the script when no arguments are given.
    pub fn requires_args(mut self, usage: &'static str) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Reply used when the script prints nothing.
    pub fn empty_reply(mut self, reply: &'static str) -> Self {
        self.empty_reply = Some(reply);
        self
    }
}

#[async_trait]
impl CommandHandler for ScriptCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn shows_loading(&self) -> bool {
        self.loading
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        if let Some(usage) = self.usage {
            if ctx.message.args.is_empty() {
                return Ok(usage.into());
            }
        }

        info!(script = %self.script, "Running script for !{}", self.name);
        let output = self.runner.run(self.script, &ctx.message.args).await?;

        if let Some(error) = script_error(&output) {
            warn!(script = %self.script, "Script reported an error: {}", error);
            return Ok(format!("❌ {}", error).into());
        }
        if output.is_empty() {
            return Ok(self
                .empty_reply
                .unwrap_or("El script no devolvió nada, intenta más rato.")
                .into());
        }
        Ok(Reply::Text(output))
    }
}

#[derive(Debug, Deserialize)]
struct ImageOutput {
    #[serde(rename = "type")]
    kind: String,
    url: String,
    #[serde(default)]
    caption: Option<String>,
}

/// `!random`: a random fact, sometimes with a picture.
pub struct RandomHandler {
    runner: Arc<ScriptRunner>,
}

impl RandomHandler {
    pub fn new(runner: Arc<ScriptRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl CommandHandler for RandomHandler {
    fn name(&self) -> &str {
        "random"
    }

    fn shows_loading(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        let output = self.runner.run("random_info.py", &[]).await?;

        let image = serde_json::from_str::<ImageOutput>(&output)
            .ok()
            .filter(|out| out.kind == "image");

        match image {
            Some(image) => {
                let caption = image.caption.as_deref();
                match ctx.send_image(&image.url, caption).await? {
                    Some(_) => Ok(Reply::Handled),
                    None => Ok(Reply::Text(format!(
                        "{}\n{}",
                        caption.unwrap_or_default(),
                        image.url
                    )
                    .trim()
                    .to_string())),
                }
            }
            None => Ok(Reply::Text(output)),
        }
    }
}
