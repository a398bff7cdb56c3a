//! Configuration for the relay server.

use std::env;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the relay server.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub replicate: ReplicateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Prediction API connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicateConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User-Agent sent with every submission.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Name of the environment variable holding the process-wide API token.
    ///
    /// The variable is read on every request rather than at startup, so the
    /// token can be rotated without a restart.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl ReplicateConfig {
    /// Current process-wide API token, if one is set and non-empty.
    pub fn process_token(&self) -> Option<String> {
        env::var(&self.token_env).ok().filter(|token| !token.is_empty())
    }
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_base_url() -> String {
    "https://api.replicate.com/v1".to_string()
}
fn default_user_agent() -> String {
    "llama-chat".to_string()
}
fn default_token_env() -> String {
    "REPLICATE_API_TOKEN".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (RELAY__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("api.host", default_host())?
            .set_default("api.port", default_port() as i64)?
            .set_default("replicate.base_url", default_base_url())?
            .set_default("replicate.user_agent", default_user_agent())?
            .set_default("replicate.token_env", default_token_env())?
            .set_default("logging.level", default_log_level())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
