//! Botillero - main entry point.

use anyhow::Context;
use bot_services::ScriptRunner;
use botillero::api::{self, AppState};
use botillero::router::KeywordTable;
use botillero::{
    adapt, builtin_table, AppResult, ChatTransport, CommandContext, Config, Router, Services,
    Soundboard,
};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whatsapp_client::{MessageReceiver, WhatsAppClient};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting Botillero v{}...", env!("CARGO_PKG_VERSION"));

    let mut whatsapp = WhatsAppClient::new(&config.whatsapp.service_url)
        .context("Failed to create WhatsApp client")?;
    if let Some(token) = &config.whatsapp.api_token {
        whatsapp = whatsapp.with_api_token(SecretString::new(token.clone()));
    }

    if !whatsapp.health_check().await {
        error!("WhatsApp gateway not reachable at {}", config.whatsapp.service_url);
        return Err(anyhow::anyhow!("WhatsApp gateway not reachable").into());
    }
    info!("WhatsApp gateway healthy");

    let http = reqwest::Client::builder()
        .timeout(config.services.http_timeout)
        .user_agent(concat!("botillero/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;
    let scripts = ScriptRunner::new(
        &config.bot.python,
        &config.bot.scripts_dir,
        config.bot.script_timeout,
    );
    let offset = config.bot.utc_offset();

    let table = builtin_table(Services::new(http, scripts, offset));
    info!("Registered {} command handlers", table.len());

    let sounds = Soundboard::new(&config.bot.sounds_dir);
    let sound_count = sounds.commands().await.len();
    if sound_count == 0 {
        warn!("No sounds found in {}", sounds.dir().display());
    } else {
        info!("Loaded {} sound commands", sound_count);
    }

    let keywords = match &config.bot.keywords_file {
        Some(path) => KeywordTable::from_file(path)
            .await
            .with_context(|| format!("Failed to load keyword rules from {}", path.display()))?,
        None => KeywordTable::default(),
    };

    let router = Arc::new(
        Router::new(table, sounds, offset)
            .with_keywords(keywords)
            .with_acknowledgements(config.bot.acknowledge_commands),
    );
    let transport: Arc<dyn ChatTransport> = Arc::new(whatsapp.clone());

    if config.notify.enabled {
        let state = AppState::new(transport.clone(), config.notify.group_id.clone())
            .with_quota(config.notify.per_minute);
        if state.group_id.is_none() {
            warn!("Notification group not configured - notifications will be rejected");
        }
        let app = api::create_router(state);
        let addr = config.notify.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind notification API to {}", addr))?;
        info!("Notification API listening on {}", addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Notification API error: {}", e);
            }
        });
    }

    info!("Listening for messages...");

    let receiver = MessageReceiver::new(whatsapp, config.whatsapp.poll_interval);
    let mut stream = Box::pin(receiver.stream());

    // Main message loop
    loop {
        tokio::select! {
            Some(raw) = stream.next() => {
                let Some(message) = adapt(&raw) else {
                    continue;
                };
                let ctx = CommandContext::new(message, transport.clone());
                let router = router.clone();
                tokio::spawn(async move {
                    router.dispatch(&ctx).await;
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
