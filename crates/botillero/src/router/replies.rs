//! Commands answered with a fixed string.

const STATIC_REPLIES: &[(&str, &str)] = &[
    ("hola", "¡Wena! 👋 Escribe `!menu` pa' ver todo lo que hago."),
    ("gracias", "De nada po. 🤝"),
    ("once", "¿Y quién pone el pan? 🥖"),
    ("chao", "Chao nomás. 👋"),
    ("github", "Mi código vive en GitHub, búscame como *botillero*. 🐙"),
];

/// Fixed answer for `command`, if it has one.
pub fn static_reply(command: &str) -> Option<String> {
    if command == "version" {
        return Some(format!("🤖 Botillero v{}", env!("CARGO_PKG_VERSION")));
    }
    STATIC_REPLIES
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, reply)| reply.to_string())
}
