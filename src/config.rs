use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Level for this crate and the HTTP layer when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HS256 secret used to validate bearer tokens
    pub auth_jwt_secret: Option<String>,

    /// Postgres URL. Entries are kept in memory when unset.
    pub db_url: Option<String>,

    /// Quiet period after which a typing indicator expires
    #[serde(default = "default_typing_expiry_ms")]
    pub typing_expiry_ms: u64,

    /// Per-connection outbound frame queue
    #[serde(default = "default_ws_send_queue")]
    pub ws_send_queue: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn typing_expiry(&self) -> Duration {
        Duration::from_millis(self.typing_expiry_ms)
    }

    /// Origins accepted by the CORS layer
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tracing filter used when `RUST_LOG` is unset
    pub fn log_filter(&self) -> String {
        let level = self.log_level.trim();
        format!("journal_collab={level},tower_http={level},axum::rejection=trace,info")
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            auth_jwt_secret: None,
            db_url: None,
            typing_expiry_ms: default_typing_expiry_ms(),
            ws_send_queue: default_ws_send_queue(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_typing_expiry_ms() -> u64 {
    3000
}

fn default_ws_send_queue() -> usize {
    256
}
