use std::collections::HashMap;

use super::script::{Direction, MigrationScript};
use crate::error::{Result, ShiftError};

/// The aggregated set of migration scripts.
///
/// Sorted by `(version, direction)`; each `(version, direction)` pair
/// appears exactly once.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    scripts: Vec<MigrationScript>,
}

impl Registry {
    /// Build a registry from scripts in source enumeration order.
    ///
    /// A second script with the same `(version, direction)` is an error; the
    /// earlier one is reported as `first`.
    pub fn from_scripts(scripts: Vec<MigrationScript>) -> Result<Self> {
        let mut seen: HashMap<(i64, Direction), String> = HashMap::with_capacity(scripts.len());
        for script in &scripts {
            if let Some(first) = seen.get(&(script.version, script.direction)) {
                return Err(ShiftError::Duplicate {
                    version: script.version,
                    direction: script.direction,
                    first: first.clone(),
                    second: script.origin.clone(),
                });
            }
            seen.insert((script.version, script.direction), script.origin.clone());
        }

        let mut scripts = scripts;
        scripts.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.direction.cmp(&b.direction))
        });
        Ok(Self { scripts })
    }

    pub fn scripts(&self) -> &[MigrationScript] {
        &self.scripts
    }

    /// Up scripts in ascending version order.
    pub fn up_scripts(&self) -> impl Iterator<Item = &MigrationScript> {
        self.scripts
            .iter()
            .filter(|s| s.direction == Direction::Up)
    }

    pub fn find(&self, version: i64, direction: Direction) -> Option<&MigrationScript> {
        self.scripts
            .binary_search_by(|s| {
                s.version
                    .cmp(&version)
                    .then_with(|| s.direction.cmp(&direction))
            })
            .ok()
            .map(|idx| &self.scripts[idx])
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
