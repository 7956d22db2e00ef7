use chrono::{DateTime, Utc};
use serde::Serialize;

/// A row of the tracking table.
///
/// There is at most one record per version; retries overwrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AppliedRecord {
    pub version: i64,
    pub name: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
    pub exec_ms: i32,
    pub success: bool,
}

/// Keep only successful records, preserving order.
pub fn successful(records: Vec<AppliedRecord>) -> Vec<AppliedRecord> {
    records.into_iter().filter(|r| r.success).collect()
}
