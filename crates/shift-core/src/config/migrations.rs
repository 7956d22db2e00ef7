use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default tracking table name.
pub const DEFAULT_TABLE: &str = "schema_migrations";

/// Default advisory lock key.
pub const DEFAULT_LOCK_KEY: i64 = 913_551_337_114_213_777;

/// Default internal bound for one locked run, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Migration engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Source directories, in precedence order.
    #[serde(default = "default_dirs")]
    pub dirs: Vec<PathBuf>,

    /// Tracking table name.
    #[serde(default = "default_table")]
    pub table: String,

    /// Advisory lock key.
    #[serde(default = "default_lock_key")]
    pub lock_key: i64,

    /// Enable `down`. Reverting is destructive, keep it off for services.
    #[serde(default)]
    pub allow_down: bool,

    /// Internal bound for a locked run, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dirs: default_dirs(),
            table: default_table(),
            lock_key: default_lock_key(),
            allow_down: false,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("migrations")]
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_lock_key() -> i64 {
    DEFAULT_LOCK_KEY
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
