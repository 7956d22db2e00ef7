use std::path::PathBuf;

use thiserror::Error;

use crate::migration::Direction;

/// Core error type for SHIFT operations.
#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("no migration source configured")]
    NoSources,

    #[error("Failed to load migrations from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate migration for version {version} dir {direction} ({first} and {second})")]
    Duplicate {
        version: i64,
        direction: Direction,
        first: String,
        second: String,
    },

    #[error("checksum mismatch at {version}: have {recorded} want {current}")]
    Drift {
        version: i64,
        recorded: String,
        current: String,
    },

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("migration {version} ({name}) failed: {message}")]
    Execution {
        version: i64,
        name: String,
        message: String,
    },

    #[error("down is disabled; set allow_down = true to enable")]
    DownDisabled,

    #[error("no down migration for version {version} ({name})")]
    NoDownMigration { version: i64, name: String },

    #[error("Migration lock error: {0}")]
    Lock(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl ShiftError {
    /// Whether the error happened while loading sources, before any state was touched.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ShiftError::NoSources | ShiftError::Load { .. } | ShiftError::Duplicate { .. }
        )
    }
}

/// Result type alias using ShiftError.
pub type Result<T> = std::result::Result<T, ShiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message() {
        let err = ShiftError::Duplicate {
            version: 20240101,
            direction: Direction::Up,
            first: "a/20240101_x.up.sql".into(),
            second: "b/20240101_y.up.sql".into(),
        };
        assert!(err
            .to_string()
            .starts_with("duplicate migration for version 20240101 dir up"));
        assert!(err.is_load_error());
    }

    #[test]
    fn test_drift_is_not_load_error() {
        let err = ShiftError::Drift {
            version: 1,
            recorded: "aa".into(),
            current: "bb".into(),
        };
        assert!(!err.is_load_error());
        assert_eq!(err.to_string(), "checksum mismatch at 1: have aa want bb");
    }
}
