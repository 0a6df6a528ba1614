//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads an optional `geflip.toml` and deserializes into strongly-typed
//! structs. Every key has a built-in default, so the file only needs the
//! values being overridden. The API user agent is referenced by env-var
//! name and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "geflip.toml";

/// Used when neither `--ua` nor the configured env var is set.
pub const FALLBACK_USER_AGENT: &str = "geflip/0.1 (+contact unset)";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the real-time prices API (mapping, latest, 1h).
    pub wiki_base_url: String,
    /// Official catalogue detail endpoint; `?item={id}` is appended.
    pub catalogue_detail_url: String,
    /// Name of the env var holding the descriptive User-Agent.
    pub user_agent_env: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            wiki_base_url: "https://prices.runescape.wiki/api/v1/osrs".to_string(),
            catalogue_detail_url:
                "https://services.runescape.com/m=itemdb_oldschool/api/catalogue/detail.json"
                    .to_string(),
            user_agent_env: "WIKI_USER_AGENT".to_string(),
            timeout_secs: 20,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "geflip=warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load an explicitly named file, or fall back to `geflip.toml` if it
    /// exists, or to built-in defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Resolve the User-Agent: explicit override first, then the configured
    /// env var, then a generic fallback.
    pub fn resolve_user_agent(&self, override_ua: Option<&str>) -> String {
        if let Some(ua) = override_ua.filter(|ua| !ua.trim().is_empty()) {
            return ua.to_string();
        }
        match std::env::var(&self.api.user_agent_env) {
            Ok(ua) if !ua.trim().is_empty() => ua,
            _ => {
                warn!(
                    env = %self.api.user_agent_env,
                    "No User-Agent configured, using generic fallback"
                );
                FALLBACK_USER_AGENT.to_string()
            }
        }
    }
}
