//! # Cart Configuration
//!
//! Settings for the session layer, loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FARMCART_HISTORY_CHECK=false                                       │
//! │     FARMCART_HISTORY_TIMEOUT_MS=500                                    │
//! │     FARMCART_DB_PATH=./farmcart.db                                     │
//! │     FARMCART_LOG=info,farmcart=trace                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/farmcart/farmcart.toml (Linux)                           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! history_check_enabled = true
//! history_check_timeout_ms = 2000
//! database_path = "/var/lib/farmcart/farmcart.db"
//! log_filter = "info,farmcart=debug,sqlx=warn"
//! currency_symbol = "₹"
//! ```
//!
//! ## Thread Safety
//! Read-only after loading; the service keeps its own copy.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const ENV_HISTORY_CHECK: &str = "FARMCART_HISTORY_CHECK";
const ENV_HISTORY_TIMEOUT_MS: &str = "FARMCART_HISTORY_TIMEOUT_MS";
const ENV_DB_PATH: &str = "FARMCART_DB_PATH";
const ENV_LOG: &str = "FARMCART_LOG";

/// Upper bound for the history timeout. A buyer is waiting on it.
const MAX_HISTORY_TIMEOUT_MS: u64 = 60_000;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// CartConfig
// =============================================================================

/// Session layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Consult the buyer's past orders before adding a free item.
    /// Default: true
    pub history_check_enabled: bool,

    /// How long an order history lookup may take before the add goes
    /// ahead without it.
    /// Default: 2000 ms
    pub history_check_timeout_ms: u64,

    /// SQLite file holding order history.
    /// Default: `<platform data dir>/farmcart.db`
    pub database_path: PathBuf,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Prefix for formatted amounts.
    pub currency_symbol: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            history_check_enabled: true,
            history_check_timeout_ms: 2000,
            database_path: default_database_path(),
            log_filter: "info,farmcart=debug,sqlx=warn".to_string(),
            currency_symbol: "₹".to_string(),
        }
    }
}

impl CartConfig {
    /// Loads configuration from file, environment and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, or the platform config dir), if it exists
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path.or_else(default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Defaults overridden by environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading cart config from file");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CartConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_HISTORY_CHECK) {
            self.history_check_enabled = parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidEnv {
                    key: ENV_HISTORY_CHECK.to_string(),
                    value: value.clone(),
                }
            })?;
            debug!(
                enabled = self.history_check_enabled,
                "Overriding history check from environment"
            );
        }

        if let Some(value) = lookup(ENV_HISTORY_TIMEOUT_MS) {
            self.history_check_timeout_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_HISTORY_TIMEOUT_MS.to_string(),
                    value: value.clone(),
                })?;
        }

        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_check_timeout_ms == 0 || self.history_check_timeout_ms > MAX_HISTORY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "history_check_timeout_ms must be between 1 and {}",
                MAX_HISTORY_TIMEOUT_MS
            )));
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path is empty".into()));
        }

        Ok(())
    }

    pub fn history_check_timeout(&self) -> Duration {
        Duration::from_millis(self.history_check_timeout_ms)
    }

    /// Formats a paise amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = CartConfig::default();
    /// assert_eq!(config.format_currency(5500), "₹55.00");
    /// ```
    pub fn format_currency(&self, paise: i64) -> String {
        let whole = paise / 100;
        let frac = (paise % 100).abs();

        format!(
            "{}{}{}.{:02}",
            if paise < 0 { "-" } else { "" },
            self.currency_symbol,
            whole.abs(),
            frac
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Platform data directory, or the working directory when there is none.
fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("in", "farmcart", "farmcart")
        .map(|dirs| dirs.data_dir().join("farmcart.db"))
        .unwrap_or_else(|| PathBuf::from("farmcart.db"))
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("in", "farmcart", "farmcart")
        .map(|dirs| dirs.config_dir().join("farmcart.toml"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::default();
        assert!(config.history_check_enabled);
        assert_eq!(config.history_check_timeout(), Duration::from_secs(2));
        assert!(config.database_path.ends_with("farmcart.db"));
        assert_eq!(config.currency_symbol, "₹");
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_partial_file_keeps_defaults() {
        let config = CartConfig::from_toml_str(
            r#"
            history_check_enabled = false
            database_path = "/tmp/orders.db"
            "#,
        )
        .unwrap();

        assert!(!config.history_check_enabled);
        assert_eq!(config.database_path, PathBuf::from("/tmp/orders.db"));
        assert_eq!(config.history_check_timeout_ms, 2000);
    }

    #[test]
    fn test_toml_rejects_bad_timeout() {
        let err = CartConfig::from_toml_str("history_check_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CartConfig::from_toml_str("history_check_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CartConfig::default();
        config
            .apply_env(env(&[
                ("FARMCART_HISTORY_CHECK", "off"),
                ("FARMCART_HISTORY_TIMEOUT_MS", "750"),
                ("FARMCART_DB_PATH", "/data/farm.db"),
                ("FARMCART_LOG", "warn"),
            ]))
            .unwrap();

        assert!(!config.history_check_enabled);
        assert_eq!(config.history_check_timeout(), Duration::from_millis(750));
        assert_eq!(config.database_path, PathBuf::from("/data/farm.db"));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = CartConfig::default();
        let err = config
            .apply_env(env(&[("FARMCART_HISTORY_CHECK", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref key, .. } if key == "FARMCART_HISTORY_CHECK"));

        let err = config
            .apply_env(env(&[("FARMCART_HISTORY_TIMEOUT_MS", "-5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = CartConfig::from_file(Path::new("/nonexistent/farmcart.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_format_currency() {
        let config = CartConfig::default();
        assert_eq!(config.format_currency(5500), "₹55.00");
        assert_eq!(config.format_currency(1), "₹0.01");
        assert_eq!(config.format_currency(0), "₹0.00");
        assert_eq!(config.format_currency(-1234), "-₹12.34");
    }
}
