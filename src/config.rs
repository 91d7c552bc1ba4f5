use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::models::LayoutKind;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Without a URL the service keeps its sheets in process memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 20,
        }
    }
}

/// Table names and the row layout used for orders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub layout: LayoutKind,
    pub orders_table: String,
    pub report_table: String,
    pub restaurants_table: String,
    pub favorites_table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Shared,
            orders_table: "Orders".to_string(),
            report_table: "Weekly Report".to_string(),
            restaurants_table: "Restaurants".to_string(),
            favorites_table: "Favorites".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound for one whole sync, in seconds
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl AppConfig {
    /// Load from `LUNCH__*` environment variables on top of the defaults,
    /// e.g. `LUNCH__SERVER__PORT=9000` or `LUNCH__STORE__LAYOUT=per-restaurant`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config: AppConfig = Config::builder()
            .add_source(
                Environment::with_prefix("LUNCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if config.database.url.is_none() {
            config.database.url = std::env::var("DATABASE_URL").ok();
        }

        Ok(config)
    }
}
