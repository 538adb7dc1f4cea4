//! Canned reactions to words that show up anywhere in a message.

use crate::error::{AppError, AppResult};
use crate::platform::CommandContext;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// One keyword set and what the bot answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    /// Reaction put on the triggering message
    #[serde(default)]
    pub emoji: Option<String>,
    pub reply: String,
}

/// Ordered rules. The first rule with a keyword contained in the message wins.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
}

impl KeywordTable {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                rule.keywords = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                rule
            })
            .filter(|rule| !rule.keywords.is_empty() && !rule.reply.trim().is_empty())
            .collect();
        Self { rules }
    }

    /// Parse a JSON array of rules.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let rules: Vec<KeywordRule> = serde_json::from_str(json)
            .map_err(|e| AppError::Command(format!("invalid keyword rules: {}", e)))?;
        Ok(Self::new(rules))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let table = Self::from_json(&json)?;
        info!(path = %path.display(), rules = table.len(), "Keyword rules loaded");
        Ok(table)
    }

    pub fn matching(&self, text: &str) -> Option<&KeywordRule> {
        let text = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
    }

    /// React and reply if `ctx` contains a keyword. Returns whether it did.
    pub async fn respond(&self, ctx: &CommandContext) -> AppResult<bool> {
        let Some(rule) = self.matching(&ctx.message.text) else {
            return Ok(false);
        };
        debug!(chat = %ctx.message.chat_id, keyword = %rule.keywords[0], "Keyword matched");

        if let Some(emoji) = &rule.emoji {
            ctx.react(emoji).await;
        }
        ctx.reply(&rule.reply).await?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> KeywordTable {
        KeywordTable::from_json(
            r#"[
                {"keywords": ["feliz cumple"], "emoji": "🎂", "reply": "¡Que los cumplas feliz!"},
                {"keywords": ["Asado", "  "], "reply": "¿Y a qué hora llego?"},
                {"keywords": [], "reply": "nunca"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_substring_match_ignores_case() {
        let table = table();

        assert_eq!(table.len(), 2);
        let rule = table.matching("Oigan, ¿hay ASADO el sábado?").unwrap();
        assert_eq!(rule.reply, "¿Y a qué hora llego?");
        assert_eq!(rule.emoji, None);
        assert!(table.matching("nada que ver").is_none());
    }

    #[test]
    fn test_first_rule_wins() {
        let table = table();
        let rule = table.matching("feliz cumple, te debo el asado").unwrap();
        assert_eq!(rule.emoji.as_deref(), Some("🎂"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(KeywordTable::from_json("{\"keywords\": 1}").is_err());
    }

    #[test]
    fn test_shipped_rules_parse() {
        let table = KeywordTable::from_json(include_str!("../../../../keywords.example.json"))
            .unwrap();
        assert!(!table.is_empty());
    }

    #[tokio::test]
    async fn test_rules_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, r#"[{"keywords": ["salud"], "reply": "🍻"}]"#).unwrap();

        let table = KeywordTable::from_file(&path).await.unwrap();

        assert_eq!(table.matching("¡Salud!").unwrap().reply, "🍻");
        assert!(KeywordTable::from_file(dir.path().join("missing.json")).await.is_err());
    }
}
