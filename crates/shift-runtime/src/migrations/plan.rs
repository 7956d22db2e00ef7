use std::collections::HashMap;

use tracing::warn;

use shift_core::error::{Result, ShiftError};
use shift_core::migration::{AppliedRecord, AvailableScript, Direction, MigrationScript, Registry};

fn successful_by_version(applied: &[AppliedRecord]) -> HashMap<i64, &AppliedRecord> {
    applied
        .iter()
        .filter(|r| r.success)
        .map(|r| (r.version, r))
        .collect()
}

/// Up scripts without a successful record, ascending by version.
///
/// Every successfully applied version is first checked against the loaded
/// script; a checksum mismatch fails the whole plan.
pub(crate) fn pending_up<'a>(
    registry: &'a Registry,
    applied: &[AppliedRecord],
) -> Result<Vec<&'a MigrationScript>> {
    let done = successful_by_version(applied);

    for script in registry.up_scripts() {
        if let Some(record) = done.get(&script.version) {
            if record.checksum != script.checksum {
                return Err(ShiftError::Drift {
                    version: script.version,
                    recorded: record.checksum.clone(),
                    current: script.checksum.clone(),
                });
            }
        }
    }

    let mut orphaned: Vec<_> = done
        .keys()
        .filter(|v| registry.find(**v, Direction::Up).is_none())
        .collect();
    orphaned.sort();
    for version in orphaned {
        warn!("Applied migration {} has no up script in any source", version);
    }

    let mut pending: Vec<_> = registry
        .up_scripts()
        .filter(|s| !done.contains_key(&s.version))
        .collect();
    pending.sort_by_key(|s| s.version);
    Ok(pending)
}

/// Status view of every up script. Drift is reported, never raised.
pub(crate) fn inspect(registry: &Registry, applied: &[AppliedRecord]) -> Vec<AvailableScript> {
    let done = successful_by_version(applied);
    registry
        .up_scripts()
        .map(|script| {
            let record = done.get(&script.version);
            AvailableScript {
                version: script.version,
                name: script.name.clone(),
                pending: record.is_none(),
                drifted: record.is_some_and(|r| r.checksum != script.checksum),
            }
        })
        .collect()
}
