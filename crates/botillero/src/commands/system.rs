//! Menu, chat id and ping.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::platform::CommandContext;
use async_trait::async_trait;
use chrono::Utc;

const MENU: &[(&str, &[(&str, &str)])] = &[
    (
        "UTILIDAD ⚙️",
        &[
            ("!ping", "Mide la latencia del bot 🏓"),
            ("!metro", "Estado de la red de Metro 🚇"),
            ("!feriados", "Muestra los próximos feriados 🗓️"),
            ("!far <comuna>", "Farmacias de turno ⚕️"),
            ("!clima <ciudad>", "El tiempo en tu ciudad 🌦️"),
            ("!sismos", "Últimos sismos en Chile 🌋"),
            ("!sec / !secrm", "Clientes sin luz, nacional o RM 💡"),
            ("!valores", "Indicadores económicos 💸"),
            ("!bencina <comuna>", "Bencineras más baratas ⛽"),
            ("!bolsa", "Estado de la bolsa de Santiago 📈"),
        ],
    ),
    (
        "FÚTBOL ⚽",
        &[
            ("!tabla", "Tabla de posiciones del torneo nacional 🏆"),
            ("!prox", "Próximos partidos del torneo 🔜"),
            ("!partidos", "Partidos de la fecha actual 📅"),
            ("!tclasi", "Tabla de clasificatorias 🇨🇱"),
            ("!clasi", "Partidos de clasificatorias 🇨🇱"),
            ("!mundial", "Resumen del Mundial 🌍"),
        ],
    ),
    (
        "BÚSQUEDA 🔍",
        &[
            ("!noticias", "Últimas noticias nacionales 📰"),
            ("!g <búsqueda>", "Busca en internet 🔎"),
            ("!wiki <búsqueda>", "Busca en Wikipedia 📚"),
            ("!net <dominio|ip>", "WHOIS, DNS y geolocalización 🌐"),
        ],
    ),
    (
        "ENTRETENCIÓN 🎉",
        &[
            ("!s", "Crea un sticker (respondiendo a imagen/video) 🖼️"),
            ("!toimg", "Convierte un sticker a imagen/gif 🔄"),
            ("!random", "Un dato al azar 🎲"),
            ("!18, !navidad, !añonuevo", "Cuenta regresiva ⏳"),
        ],
    ),
    (
        "OTROS 🤖",
        &[
            ("!ayuda <pregunta>", "Te digo qué comando usar 🧠"),
            ("!id", "Muestra el ID del chat 🆔"),
        ],
    ),
];

pub fn menu_text() -> String {
    let mut menu = String::from("🤖 *¡Wena! Soy Botillero, tu asistente.* 🤖\n\n");
    menu.push_str("Aquí tení la lista actualizada de todas las weás que cacho hacer.\n");
    menu.push_str("_Usa `!` o `/` pa' los comandos, da lo mismo._\n\n");

    for (category, items) in MENU {
        menu.push_str(&format!("*--- {} ---*\n", category));
        for (cmd, desc) in *items {
            menu.push_str(&format!("◦ *{}*: {}\n", cmd, desc));
        }
        menu.push('\n');
    }
    menu.trim_end().to_string()
}

pub struct MenuHandler;

#[async_trait]
impl CommandHandler for MenuHandler {
    fn name(&self) -> &str {
        "menu"
    }

    fn aliases(&self) -> &[&'static str] {
        &["help"]
    }

    async fn execute(&self, _ctx: &CommandContext) -> AppResult<Reply> {
        Ok(Reply::Text(menu_text()))
    }
}

pub struct IdHandler;

#[async_trait]
impl CommandHandler for IdHandler {
    fn name(&self) -> &str {
        "id"
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        Ok(Reply::Text(format!(
            "ℹ️ El ID de este chat es:\n{}",
            ctx.message.chat_id
        )))
    }
}

pub struct PingHandler;

/// Round trip from the message timestamp (seconds) to `now_ms`.
pub fn ping_reply(timestamp: i64, now_ms: i64) -> String {
    if timestamp <= 0 {
        return "🏓 *Pong!*".into();
    }
    let latency = now_ms.saturating_sub(timestamp.saturating_mul(1000)).max(0);
    format!("🏓 *Pong!*\nLatencia: {} ms", latency)
}

#[async_trait]
impl CommandHandler for PingHandler {
    fn name(&self) -> &str {
        "ping"
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        Ok(Reply::Text(ping_reply(
            ctx.message.timestamp,
            Utc::now().timestamp_millis(),
        )))
    }
}
