//! Command parsing.
//!
//! A command is the first whitespace-delimited token of the trimmed text
//! when that text starts with `!` or `/`. Exactly one prefix character is
//! removed and the command is lower-cased; the remaining tokens become the
//! arguments untouched.

/// Characters that mark a command.
pub const PREFIXES: [char; 2] = ['!', '/'];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased command without prefix; `None` for plain chat text.
    /// `Some("")` when the text is a bare prefix such as `"!"`.
    pub command: Option<String>,
    pub args: Vec<String>,
}

impl ParsedCommand {
    pub fn has_prefix(&self) -> bool {
        self.command.is_some()
    }
}

pub fn parse(text: &str) -> ParsedCommand {
    let trimmed = text.trim();
    let mut tokens = trimmed.split_whitespace();

    if !trimmed.starts_with(&PREFIXES[..]) {
        return ParsedCommand {
            command: None,
            args: tokens.map(str::to_string).collect(),
        };
    }

    // Both prefixes are one byte wide.
    let command = tokens
        .next()
        .map(|first| first[1..].to_lowercase())
        .unwrap_or_default();

    ParsedCommand {
        command: Some(command),
        args: tokens.map(str::to_string).collect(),
    }
}

/// Remove in-body mention tokens (`@` followed by digits).
pub fn strip_mentions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '@' && chars.peek().is_some_and(|next| next.is_ascii_digit()) {
            while chars.peek().is_some_and(|next| next.is_ascii_digit()) {
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefixed_command() {
        let parsed = parse("  !Clima  Punta Arenas ");
        assert_eq!(parsed.command.as_deref(), Some("clima"));
        assert_eq!(parsed.args, args(&["Punta", "Arenas"]));
        assert!(parsed.has_prefix());
    }

    #[test]
    fn test_slash_prefix() {
        let parsed = parse("/TABLA");
        assert_eq!(parsed.command.as_deref(), Some("tabla"));
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn test_args_keep_case() {
        let parsed = parse("!wiki Arturo PRAT");
        assert_eq!(parsed.args, args(&["Arturo", "PRAT"]));
    }

    #[test]
    fn test_unprefixed_text() {
        let parsed = parse("hola  cabros");
        assert_eq!(parsed.command, None);
        assert_eq!(parsed.args, args(&["hola", "cabros"]));
        assert!(!parsed.has_prefix());
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(parse(""), ParsedCommand::default());
        assert_eq!(parse("   \n\t"), ParsedCommand::default());
    }

    #[test]
    fn test_only_one_prefix_stripped() {
        assert_eq!(parse("!!menu").command.as_deref(), Some("!menu"));
        assert_eq!(parse("/!menu").command.as_deref(), Some("!menu"));
    }

    #[test]
    fn test_bare_prefix_is_empty_command() {
        let bare = parse("!");
        assert_eq!(bare.command.as_deref(), Some(""));
        assert!(bare.args.is_empty());

        let spaced = parse("! foo");
        assert_eq!(spaced.command.as_deref(), Some(""));
        assert_eq!(spaced.args, args(&["foo"]));
    }

    #[test]
    fn test_non_ascii_command() {
        assert_eq!(parse("!AñoNuevo").command.as_deref(), Some("añonuevo"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        for text in ["!Tabla x", "/s", "hola", "", "!", "  !!menu  a b "] {
            assert_eq!(parse(text), parse(text));
        }
    }

    #[test]
    fn test_strip_mentions() {
        assert_eq!(strip_mentions("@56912345678 !menu"), " !menu");
        assert_eq!(strip_mentions("hola @bot y @123"), "hola @bot y ");
        assert_eq!(strip_mentions("correo@gmail.com"), "correo@gmail.com");
        assert_eq!(strip_mentions("@"), "@");
    }
}
