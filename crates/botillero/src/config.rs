//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// WhatsApp gateway configuration
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Bot behaviour
    #[serde(default)]
    pub bot: BotConfig,

    /// Notification endpoint
    #[serde(default)]
    pub notify: NotifyConfig,

    /// External lookups
    #[serde(default)]
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// WhatsApp gateway REST endpoint
    #[serde(default = "default_gateway_url")]
    pub service_url: String,

    /// Bearer token for the gateway, if it requires one
    #[serde(default)]
    pub api_token: Option<String>,

    /// Poll interval for messages
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory scanned for soundboard clips
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: PathBuf,

    /// Directory holding the helper scripts
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// JSON file with keyword reaction rules
    #[serde(default)]
    pub keywords_file: Option<PathBuf>,

    /// Interpreter used to run helper scripts
    #[serde(default = "default_python")]
    pub python: String,

    /// Maximum run time of a helper script
    #[serde(default = "default_script_timeout", with = "humantime_serde")]
    pub script_timeout: Duration,

    /// Local time offset used for countdowns and reports (Chile is UTC-3)
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    /// Send an "Al tiro @user" ping before running table commands
    #[serde(default)]
    pub acknowledge_commands: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Serve the notification endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_notify_port")]
    pub port: u16,

    /// Chat that receives notifications
    #[serde(default)]
    pub group_id: Option<String>,

    /// Notifications delivered per minute, 0 for no limit
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Timeout for every outbound HTTP lookup
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub http_timeout: Duration,
}

impl BotConfig {
    /// Configured UTC offset, falling back to UTC when out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

impl NotifyConfig {
    /// Address the notification API binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .trim()
            .parse()
            .with_context(|| format!("Invalid notify.listen_addr {:?}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

// Default implementations
impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            service_url: default_gateway_url(),
            api_token: None,
            poll_interval: default_poll_interval(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            sounds_dir: default_sounds_dir(),
            scripts_dir: default_scripts_dir(),
            keywords_file: None,
            python: default_python(),
            script_timeout: default_script_timeout(),
            utc_offset_minutes: default_utc_offset_minutes(),
            acknowledge_commands: false,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            listen_addr: default_listen_addr(),
            port: default_notify_port(),
            group_id: None,
            per_minute: default_per_minute(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            http_timeout: default_http_timeout(),
        }
    }
}

// Default value functions
fn default_gateway_url() -> String {
    "http://whatsapp-gateway:3000".into()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_log_level() -> String {
    "info".into()
}

fn default_sounds_dir() -> PathBuf {
    "mp3".into()
}

fn default_scripts_dir() -> PathBuf {
    "scripts/python".into()
}

fn default_python() -> String {
    "python".into()
}

fn default_script_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_utc_offset_minutes() -> i32 {
    -180
}

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_notify_port() -> u16 {
    3001
}

fn default_per_minute() -> u32 {
    30
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(15)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Chat ids like 56912345678@c.us must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
