use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API server address
    #[serde(default = "default_address")]
    pub address: String,
    /// API server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory served as static content (dashboard build, snapshots)
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./public")
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Connection pool max size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Automatic migration on startup
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

fn default_db_url() -> String {
    "sqlite://pulseguard.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_auto_migrate() -> bool {
    true
}

/// Broadcast channel configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastConfig {
    /// Buffered events per subscriber before a slow client starts lagging
    #[serde(default = "default_broadcast_capacity")]
    pub capacity: usize,
}

fn default_broadcast_capacity() -> usize {
    256
}

/// Security configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityConfig {
    /// JWT secret key
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// JWT token expiration time in minutes
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: u64,
    /// Password hashing cost (higher is more secure but slower)
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
}

fn default_jwt_secret() -> String {
    "default_secret_change_in_production".to_string()
}

fn default_jwt_expiration() -> u64 {
    60 // 60 minutes
}

fn default_password_hash_cost() -> u32 {
    10 // reasonable default for bcrypt
}

/// Escalation notifier (Telegram) configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NotifierConfig {
    /// Telegram bot token; the notifier is disabled when unset
    #[serde(default)]
    pub telegram_token: Option<String>,
    /// Chat or group id receiving escalation notifications
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    /// Base URL used to build incident links in notifications
    #[serde(default = "default_web_base")]
    pub web_base: String,
}

fn default_web_base() -> String {
    "http://localhost:4000".to_string()
}

/// Startup seeding configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedConfig {
    /// Legacy device fixture, loaded once when the devices table is empty
    #[serde(default = "default_devices_fixture")]
    pub devices_fixture: PathBuf,
}

fn default_devices_fixture() -> PathBuf {
    PathBuf::from("./data/devices.json")
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            log_level: default_log_level(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
            auto_migrate: default_auto_migrate(),
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            capacity: default_broadcast_capacity(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expiration_minutes: default_jwt_expiration(),
            password_hash_cost: default_password_hash_cost(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            devices_fixture: default_devices_fixture(),
        }
    }
}

/// Load configuration from a file or use default
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;

            let config = if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&config_str).context("Failed to parse JSON config")?
            } else if path.extension().map_or(false, |ext| ext == "toml") {
                toml::from_str(&config_str).context("Failed to parse TOML config")?
            } else {
                return Err(anyhow::anyhow!("Unsupported config file format"));
            };

            Ok(config)
        }
        None => Ok(Config::default()),
    }
}
