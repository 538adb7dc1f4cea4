//! `!ayuda`: suggest a command from a plain-language question.

use crate::commands::{CommandHandler, Reply};
use crate::error::AppResult;
use crate::platform::CommandContext;
use async_trait::async_trait;

/// Keyword groups, checked in order. First hit wins.
const KNOWLEDGE_BASE: &[(&[&str], &str)] = &[
    (&["valores", "dolar", "uf", "economia", "finanzas"], "!valores"),
    (&["clima", "tiempo", "temperatura"], "!clima [ciudad]"),
    (&["feriado", "festivo"], "!feriados"),
    (&["farmacia", "remedios"], "!far [comuna]"),
    (&["tabla", "posiciones", "liga"], "!tabla"),
    (&["partidos", "fecha", "futbol"], "!prox"),
    (&["seleccion", "chilena", "clasificatorias"], "!tclasi o !clasi"),
    (&["metro", "subterraneo"], "!metro"),
    (&["bencina", "gasolina", "combustible"], "!bencina [comuna]"),
    (&["bolsa", "acciones", "ipsa"], "!bolsa"),
    (&["sticker", "stiker", "s"], "!s"),
    (&["sismo", "temblor"], "!sismos"),
    (&["luz", "corte", "sec"], "!sec [región]"),
    (&["wikipedia", "wiki", "quien es", "que es"], "!wiki [búsqueda]"),
    (&["noticia", "actualidad", "ultima hora"], "!noticias"),
    (&["google", "buscar", "internet"], "!g [búsqueda]"),
    (&["dominio", "whois", "ip"], "!net [dominio|ip]"),
    (&["ping", "estado", "sistema"], "!ping"),
    (&["ayuda", "comando", "menu"], "!menu"),
];

const GREETING: &str = "¡Wena wn! Soy Botillero. Dime qué necesitas hacer y te ayudaré a \
encontrar el comando correcto. 🤖 Por ejemplo: `!ayuda quiero saber el clima en valparaíso`";

const NO_MATCH: &str = "Las Weas, no cacho qué comando podría ayudarte con eso. 🤔\n\n\
Prueba a ser más específico wn o escribe `!menu` para ver la lista completa de comandos.";

fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// Short keywords only count as whole words; longer ones match anywhere.
fn mentions(query: &str, keyword: &str) -> bool {
    if keyword.chars().count() <= 2 {
        query
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        query.contains(keyword)
    }
}

/// The command suggested for `query`, if any keyword matches.
pub fn suggest(query: &str) -> Option<&'static str> {
    let query = fold(query);
    KNOWLEDGE_BASE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| mentions(&query, k)))
        .map(|(_, command)| *command)
}

pub fn answer(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() || fold(query) == "ayuda" {
        return GREETING.to_string();
    }

    match suggest(query) {
        Some(command) => format!(
            "🤖 ¡Ya cache! Creo que este es el comando que buscas:\n\n\
             Para lo que necesitas, el comando correcto es:\n👉 *{}*\n\n\
             Inténtalo y avísame si te sirvió.",
            command
        ),
        None => NO_MATCH.to_string(),
    }
}

pub struct AyudaHandler;

#[async_trait]
impl CommandHandler for AyudaHandler {
    fn name(&self) -> &str {
        "ayuda"
    }

    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply> {
        Ok(Reply::Text(answer(&ctx.message.args_text())))
    }
}
