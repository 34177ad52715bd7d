//! Adapter configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve the snapshot database path and default log level once.
//!
//! # Invariants
//! - Blank environment values fall back to defaults.
//! - Resolution happens once per process; later env changes are ignored.

use once_cell::sync::OnceCell;
use quadlog_core::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "QUADLOG_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "QUADLOG_LOG_LEVEL";
const DEFAULT_DB_FILE_NAME: &str = "quadlog.sqlite3";

static CONFIG: OnceCell<AdapterConfig> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// SQLite file holding the snapshot blob.
    pub db_path: PathBuf,
    /// Level used when the host passes a blank level to `init_logging`.
    pub log_level: String,
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
        }
    }
}

/// Process-wide configuration, resolved on first use.
pub fn config() -> &'static AdapterConfig {
    CONFIG.get_or_init(AdapterConfig::from_env)
}

/// Pins the configuration before first use; later calls are ignored.
#[cfg(test)]
pub(crate) fn pin_config(config: AdapterConfig) -> &'static AdapterConfig {
    CONFIG.get_or_init(|| config)
}
