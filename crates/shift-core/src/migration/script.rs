use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ShiftError;

/// File name grammar: `<version>_<name>.<up|down>.sql`.
///
/// Versions are 8 (YYYYMMDD) to 14 (YYYYMMDDHHMMSS) digits.
static FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{8,14})_([a-zA-Z0-9_\-]+)\.(up|down)\.sql$").expect("valid file regex")
});

/// Migration name grammar, shared with generated file names.
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_\-]+$").expect("valid name regex"));

/// Direction of a migration script.
///
/// Ordering follows the direction names (`down` sorts before `up`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(ShiftError::Config(format!(
                "invalid migration direction '{}'",
                other
            ))),
        }
    }
}

/// Parsed components of a migration file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFileName {
    pub version: i64,
    pub name: String,
    pub direction: Direction,
}

impl MigrationFileName {
    /// Parse a file name. Returns `None` for names outside the grammar.
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = FILE_RE.captures(file_name)?;
        let version = caps[1].parse::<i64>().ok()?;
        let direction = caps[3].parse::<Direction>().ok()?;
        Some(Self {
            version,
            name: caps[2].to_string(),
            direction,
        })
    }

    /// Render back into `<version>_<name>.<direction>.sql`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}.sql", self.version, self.name, self.direction)
    }
}

/// Whether `name` is usable as the name part of a migration file.
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// A versioned SQL change.
///
/// Scripts are immutable once loaded; `sql` holds the trimmed body and
/// `checksum` its hex SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationScript {
    pub version: i64,
    pub name: String,
    pub direction: Direction,
    pub sql: String,
    pub checksum: String,
    /// Where the script came from (file path or `bundle:file`).
    pub origin: String,
}

impl MigrationScript {
    pub fn new(
        version: i64,
        name: impl Into<String>,
        direction: Direction,
        sql: impl AsRef<str>,
    ) -> Self {
        let sql = sql.as_ref().trim().to_string();
        let checksum = checksum(&sql);
        let name = name.into();
        Self {
            origin: format!("{}_{}.{}.sql", version, name, direction),
            version,
            name,
            direction,
            sql,
            checksum,
        }
    }

    /// Build a script from a file name and its contents.
    ///
    /// Returns `None` when the file name is not a migration file name.
    pub fn from_file(file_name: &str, origin: impl Into<String>, contents: &str) -> Option<Self> {
        let parsed = MigrationFileName::parse(file_name)?;
        Some(
            Self::new(parsed.version, parsed.name, parsed.direction, contents)
                .with_origin(origin),
        )
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Whether the body is empty after trimming.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Hex SHA-256 of the trimmed script body.
pub fn checksum(sql: &str) -> String {
    let digest = Sha256::digest(sql.trim().as_bytes());
    hex::encode(digest)
}
