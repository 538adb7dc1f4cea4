//! Bot command handlers and the table that routes to them.

mod assist;
mod lookup;
mod media;
mod scripted;
mod system;

pub use assist::AyudaHandler;
pub use lookup::{
    EarthquakeHandler, NetworkHandler, NewsHandler, OutageHandler, PharmacyHandler,
    WeatherHandler, WebSearchHandler, WikiHandler,
};
pub use media::{StickerHandler, ToImageHandler};
pub use scripted::{RandomHandler, ScriptCommand};
pub use system::{IdHandler, MenuHandler, PingHandler};

use crate::error::AppResult;
use crate::platform::CommandContext;
use async_trait::async_trait;
use bot_services::{
    EarthquakeService, NetworkService, NewsService, OutageService, PharmacyService,
    ScriptRunner, WeatherService, WebSearchService, WikipediaService,
};
use chrono::FixedOffset;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// What a handler wants sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Reply with this text, quoting the command.
    Text(String),
    /// The handler already sent everything it needed to.
    Handled,
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Canonical command name (e.g., "tabla").
    fn name(&self) -> &str;

    /// Other names that reach this handler (e.g., "ligatabla").
    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    /// React with the loading emoji before running.
    fn shows_loading(&self) -> bool {
        false
    }

    /// Execute the command.
    async fn execute(&self, ctx: &CommandContext) -> AppResult<Reply>;
}

/// Run a handler and deliver its reply. Errors go back to the caller.
pub async fn invoke(handler: &dyn CommandHandler, ctx: &CommandContext) -> AppResult<()> {
    match handler.execute(ctx).await? {
        Reply::Text(text) => {
            ctx.reply(&text).await?;
        }
        Reply::Handled => {}
    }
    Ok(())
}

/// One registered command.
pub struct DispatchEntry {
    pub name: String,
    pub aliases: Vec<String>,
    pub handler: Arc<dyn CommandHandler>,
    pub shows_loading: bool,
}

/// Command name and alias lookup. Built once at startup.
#[derive(Default)]
pub struct CommandTable {
    entries: Vec<DispatchEntry>,
    index: HashMap<String, usize>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its name and aliases. A key that is already
    /// taken keeps its first owner.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> &mut Self {
        let entry = DispatchEntry {
            name: handler.name().to_lowercase(),
            aliases: handler.aliases().iter().map(|a| a.to_lowercase()).collect(),
            shows_loading: handler.shows_loading(),
            handler,
        };
        let position = self.entries.len();

        for key in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
            if let Some(&existing) = self.index.get(key) {
                warn!(
                    command = %key,
                    owner = %self.entries[existing].name,
                    "Duplicate command key ignored"
                );
                continue;
            }
            self.index.insert(key.clone(), position);
        }

        self.entries.push(entry);
        self
    }

    pub fn resolve(&self, command: &str) -> Option<&DispatchEntry> {
        self.index.get(command).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[DispatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Clients the built-in handlers need.
#[derive(Clone)]
pub struct Services {
    pub scripts: ScriptRunner,
    pub weather: WeatherService,
    pub earthquakes: EarthquakeService,
    pub pharmacies: PharmacyService,
    pub wikipedia: WikipediaService,
    pub news: NewsService,
    pub web_search: WebSearchService,
    pub network: NetworkService,
    pub outages: OutageService,
}

impl Services {
    /// Production endpoints sharing one HTTP client.
    pub fn new(http: reqwest::Client, scripts: ScriptRunner, offset: FixedOffset) -> Self {
        Self {
            scripts,
            weather: WeatherService::new(http.clone()),
            earthquakes: EarthquakeService::new(http.clone()),
            pharmacies: PharmacyService::new(http.clone()),
            wikipedia: WikipediaService::new(http.clone()),
            news: NewsService::new(http.clone()),
            web_search: WebSearchService::new(http.clone()),
            outages: OutageService::new(http.clone(), offset),
            network: NetworkService::new(http),
        }
    }
}

/// Every built-in command.
pub fn builtin_table(services: Services) -> CommandTable {
    let runner = Arc::new(services.scripts);
    let script =
        |name: &'static str, file: &'static str| ScriptCommand::new(name, file, runner.clone());

    let mut table = CommandTable::new();
    table
        // System
        .register(Arc::new(MenuHandler))
        .register(Arc::new(IdHandler))
        .register(Arc::new(PingHandler))
        // Football
        .register(Arc::new(
            script("tabla", "tabla.py")
                .with_aliases(&["ligatabla"])
                .with_loading()
                .empty_reply("No pude obtener la tabla en este momento."),
        ))
        .register(Arc::new(
            script("prox", "proxpar.py")
                .with_aliases(&["ligapartidos"])
                .with_loading(),
        ))
        .register(Arc::new(script("partidos", "partidos.py").with_loading()))
        .register(Arc::new(
            script("tclasi", "tclasi.py").with_aliases(&["selecciontabla"]),
        ))
        .register(Arc::new(
            script("clasi", "clasi.py").with_aliases(&["seleccionpartidos"]),
        ))
        // Lives one level above the other scripts.
        .register(Arc::new(script("mundial", "../mundial.py").with_loading()))
        // Utility scripts
        .register(Arc::new(script("feriados", "feriados.py")))
        .register(Arc::new(script("valores", "valores.py")))
        .register(Arc::new(
            script("bencina", "bencina.py")
                .with_aliases(&["bencinas", "gasolina"])
                .with_loading()
                .requires_args("Indica la comuna po. Ej: `!bencina santiago`"),
        ))
        .register(Arc::new(script("bolsa", "bolsa.py").with_loading()))
        .register(Arc::new(script("metro", "metro.py").with_loading()))
        .register(Arc::new(RandomHandler::new(runner.clone())))
        // Lookups
        .register(Arc::new(WeatherHandler::new(services.weather)))
        .register(Arc::new(EarthquakeHandler::new(services.earthquakes)))
        .register(Arc::new(PharmacyHandler::new(services.pharmacies)))
        .register(Arc::new(WikiHandler::new(services.wikipedia)))
        .register(Arc::new(NewsHandler::new(services.news)))
        .register(Arc::new(WebSearchHandler::new(services.web_search)))
        .register(Arc::new(NetworkHandler::new(services.network)))
        .register(Arc::new(OutageHandler::new(services.outages)))
        // Media
        .register(Arc::new(StickerHandler))
        .register(Arc::new(ToImageHandler))
        // Other
        .register(Arc::new(AyudaHandler));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Fixed(&'static str, &'static [&'static str]);

    #[async_trait]
    impl CommandHandler for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn aliases(&self) -> &[&'static str] {
            self.1
        }

        async fn execute(&self, _ctx: &CommandContext) -> AppResult<Reply> {
            Ok(Reply::Text(self.0.to_string()))
        }
    }

    #[test]
    fn test_register_and_resolve_aliases() {
        let mut table = CommandTable::new();
        table.register(Arc::new(Fixed("tabla", &["ligatabla"])));

        assert_eq!(table.resolve("tabla").unwrap().name, "tabla");
        assert_eq!(table.resolve("ligatabla").unwrap().name, "tabla");
        assert!(table.resolve("TABLA").is_none());
        assert!(table.resolve("frobnicate").is_none());
    }

    #[test]
    fn test_duplicate_key_keeps_first_owner() {
        let mut table = CommandTable::new();
        table
            .register(Arc::new(Fixed("menu", &["help"])))
            .register(Arc::new(Fixed("help", &[])));

        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("help").unwrap().name, "menu");
    }

    #[test]
    fn test_builtin_table_covers_catalog() {
        let http = reqwest::Client::new();
        let runner = ScriptRunner::new("python", "scripts/python", Duration::from_secs(5));
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let table = builtin_table(Services::new(http, runner, offset));

        for command in [
            "menu", "help", "id", "ping", "tabla", "ligatabla", "prox", "ligapartidos",
            "partidos", "tclasi", "selecciontabla", "clasi", "seleccionpartidos", "mundial",
            "feriados", "valores", "bencina", "bolsa", "metro", "random", "clima", "sismos",
            "far", "wiki", "noticias", "g", "net", "whois", "nic", "sec", "secrm", "s", "toimg",
            "imagen", "ayuda",
        ] {
            assert!(table.resolve(command).is_some(), "missing {}", command);
        }

        assert!(table.resolve("tabla").unwrap().shows_loading);
        assert!(!table.resolve("id").unwrap().shows_loading);
        assert!(std::ptr::eq(
            table.resolve("tabla").unwrap(),
            table.resolve("ligatabla").unwrap()
        ));
    }
}
