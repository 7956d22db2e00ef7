use std::fmt;

use serde::Serialize;

use super::record::AppliedRecord;

/// Read-only summary of applied and pending migrations.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Tracking table name.
    pub table: String,
    /// Tracking rows, ordered by `(applied_at, version)`.
    pub applied: Vec<AppliedRecord>,
    /// Every known up script, ascending by version.
    pub available: Vec<AvailableScript>,
}

/// An up script as seen by the status reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableScript {
    pub version: i64,
    pub name: String,
    /// No successful record exists for this version.
    pub pending: bool,
    /// A successful record exists but its checksum differs from the script.
    pub drifted: bool,
}

impl StatusReport {
    pub fn pending(&self) -> impl Iterator<Item = &AvailableScript> {
        self.available.iter().filter(|s| s.pending)
    }

    pub fn drifted(&self) -> impl Iterator<Item = &AvailableScript> {
        self.available.iter().filter(|s| s.drifted)
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending().next().is_none()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "table: {}", self.table)?;
        if self.applied.is_empty() {
            writeln!(f, "applied: none")?;
        } else {
            writeln!(f, "applied:")?;
            for record in &self.applied {
                writeln!(
                    f,
                    "  {} {} at {} ok={}",
                    record.version,
                    record.name,
                    record.applied_at.to_rfc3339(),
                    record.success
                )?;
            }
        }
        writeln!(f, "available up:")?;
        for script in &self.available {
            let flag = if script.drifted {
                "!"
            } else if script.pending {
                "*"
            } else {
                " "
            };
            writeln!(f, "  {} {} {}", flag, script.version, script.name)?;
        }
        Ok(())
    }
}
