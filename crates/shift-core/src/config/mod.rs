mod database;
mod logging;
mod migrations;

pub use database::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use migrations::{MigrationsConfig, DEFAULT_LOCK_KEY, DEFAULT_TABLE, DEFAULT_TIMEOUT_SECS};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ShiftError};

/// Root configuration for SHIFT.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration engine configuration.
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ShiftConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ShiftError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| ShiftError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Defaults with the given database URL.
    pub fn default_with_database_url(url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Check the values the engine cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(ShiftError::Config(
                "database url is required (set [database].url or DATABASE_URL)".into(),
            ));
        }
        if self.migrations.timeout_secs == 0 {
            return Err(ShiftError::Config(
                "migrations.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    static ENV_RE: once_cell::sync::Lazy<regex_lite::Regex> = once_cell::sync::Lazy::new(|| {
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env regex")
    });

    let mut result = content.to_string();
    for cap in ENV_RE.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
