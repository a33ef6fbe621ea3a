//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads an optional `config.toml` into strongly-typed structs. Every field
//! has a default, so a missing file is not an error. Secrets (the NewsAPI
//! key) are referenced by env-var name and resolved once at startup.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const DEFAULT_POLYMARKET_URL: &str = "https://polymarket.com";
const DEFAULT_NEWSAPI_URL: &str = "https://newsapi.org/v2";
const DEFAULT_API_KEY_ENV: &str = "NEWSAPI_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_EVENTS: usize = 20;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub polymarket: PolymarketConfig,
    pub news: NewsConfig,
}

/// Identity reported in the `initialize` handshake.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "polymarket_predictions".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PolymarketConfig {
    pub base_url: String,
    /// Cap on events projected per scrape.
    pub max_events: usize,
    pub timeout_secs: u64,
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_POLYMARKET_URL.to_string(),
            max_events: DEFAULT_MAX_EVENTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    /// Name of the env var holding the NewsAPI key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NEWSAPI_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl NewsConfig {
    /// Read the API key from the configured env var.
    ///
    /// Absence is not fatal; news tools report it per call.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        match std::env::var(&self.api_key_env) {
            Ok(v) if !v.trim().is_empty() => Some(SecretString::new(v)),
            _ => {
                warn!(env = %self.api_key_env, "NewsAPI key not set; news tools will report it");
                None
            }
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            let cfg = Self::load(path)?;
            info!(path, "Loaded configuration");
            Ok(cfg)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
