//! In-memory tracking table.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use shift_core::config::DEFAULT_TABLE;
use shift_core::error::{Result, ShiftError};
use shift_core::migration::{AppliedRecord, MigrationScript, MigrationStore, StoreTransaction};

/// A store operation, recorded in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    EnsureTable,
    Applied,
    Record,
    Begin,
    Commit,
    Rollback,
}

impl StoreCall {
    /// Calls that can change persisted state.
    pub fn is_write(&self) -> bool {
        matches!(self, StoreCall::Record | StoreCall::Commit)
    }
}

#[derive(Default)]
struct State {
    records: BTreeMap<i64, AppliedRecord>,
    executed: Vec<String>,
    calls: Vec<StoreCall>,
    failing_markers: Vec<String>,
    fail_commit: bool,
    fail_record: bool,
    delete_override: Option<u64>,
    last_applied_at: Option<DateTime<Utc>>,
}

impl State {
    /// `NOW()` that never goes backwards, so ordering by time is stable.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_applied_at {
            if now <= last {
                now = last + Duration::milliseconds(1);
            }
        }
        self.last_applied_at = Some(now);
        now
    }
}

/// In-memory [`MigrationStore`] with transactional buffering.
///
/// SQL is not interpreted: committed statements are appended to
/// [`MemoryStore::executed`]. Failures are injected by marker substrings.
#[derive(Clone)]
pub struct MemoryStore {
    table: String,
    state: Arc<Mutex<State>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_table(DEFAULT_TABLE)
    }

    pub fn with_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make any script containing `marker` fail to execute.
    pub fn fail_when_sql_contains(&self, marker: impl Into<String>) {
        self.state().failing_markers.push(marker.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_markers.clear();
        state.fail_commit = false;
        state.fail_record = false;
        state.delete_override = None;
    }

    pub fn fail_commits(&self, fail: bool) {
        self.state().fail_commit = fail;
    }

    pub fn fail_records(&self, fail: bool) {
        self.state().fail_record = fail;
    }

    /// Report `rows` from every delete instead of the real count.
    pub fn override_delete_count(&self, rows: u64) {
        self.state().delete_override = Some(rows);
    }

    /// Insert a record directly, bypassing the call log.
    pub fn seed(&self, record: AppliedRecord) {
        let mut state = self.state();
        state.last_applied_at = Some(
            state
                .last_applied_at
                .map_or(record.applied_at, |last| last.max(record.applied_at)),
        );
        state.records.insert(record.version, record);
    }

    /// Records ordered by version.
    pub fn records(&self) -> Vec<AppliedRecord> {
        self.state().records.values().cloned().collect()
    }

    pub fn record_for(&self, version: i64) -> Option<AppliedRecord> {
        self.state().records.get(&version).cloned()
    }

    /// Committed SQL, in commit order.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_write()).count()
    }

    /// Whether any method has been called.
    pub fn touched(&self) -> bool {
        !self.state().calls.is_empty()
    }
}

#[async_trait]
impl MigrationStore for MemoryStore {
    fn table_name(&self) -> &str {
        &self.table
    }

    async fn ensure_table(&self) -> Result<()> {
        self.state().calls.push(StoreCall::EnsureTable);
        Ok(())
    }

    async fn applied(&self) -> Result<Vec<AppliedRecord>> {
        let mut state = self.state();
        state.calls.push(StoreCall::Applied);
        let mut rows: Vec<_> = state.records.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.applied_at
                .cmp(&b.applied_at)
                .then_with(|| a.version.cmp(&b.version))
        });
        Ok(rows)
    }

    async fn record(&self, script: &MigrationScript, exec_ms: i32, success: bool) -> Result<()> {
        let mut state = self.state();
        state.calls.push(StoreCall::Record);
        if state.fail_record {
            return Err(ShiftError::Database(format!(
                "simulated failure recording migration {}",
                script.version
            )));
        }
        let applied_at = state.now();
        state.records.insert(
            script.version,
            AppliedRecord {
                version: script.version,
                name: script.name.clone(),
                checksum: script.checksum.clone(),
                applied_at,
                exec_ms,
                success,
            },
        );
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        self.state().calls.push(StoreCall::Begin);
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            statements: Vec::new(),
            deletes: Vec::new(),
        }))
    }
}

/// Buffers statements and deletes until commit.
struct MemoryTransaction {
    state: Arc<Mutex<State>>,
    statements: Vec<String>,
    deletes: Vec<i64>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        let state = self.state.lock().unwrap();
        if let Some(marker) = state.failing_markers.iter().find(|m| sql.contains(m.as_str())) {
            return Err(ShiftError::Database(format!(
                "simulated failure on '{}'",
                marker
            )));
        }
        drop(state);
        self.statements.push(sql.to_string());
        Ok(())
    }

    async fn delete_record(&mut self, version: i64) -> Result<u64> {
        let state = self.state.lock().unwrap();
        let rows = match state.delete_override {
            Some(rows) => rows,
            None if state.records.contains_key(&version) && !self.deletes.contains(&version) => 1,
            None => 0,
        };
        drop(state);
        self.deletes.push(version);
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            state,
            statements,
            deletes,
        } = *self;
        let mut state = state.lock().unwrap();
        state.calls.push(StoreCall::Commit);
        if state.fail_commit {
            return Err(ShiftError::Database("simulated commit failure".into()));
        }
        state.executed.extend(statements);
        for version in deletes {
            state.records.remove(&version);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.state.lock().unwrap().calls.push(StoreCall::Rollback);
        Ok(())
    }
}
