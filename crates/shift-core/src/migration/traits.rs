use async_trait::async_trait;

use super::record::{successful, AppliedRecord};
use super::registry::Registry;
use super::script::MigrationScript;
use super::status::StatusReport;
use crate::error::Result;

/// The contract host applications use to drive migrations.
///
/// Kept narrow so services can run migrate-on-start without knowing about
/// sources, locks or the tracking table.
#[async_trait]
pub trait Migrate: Send + Sync {
    /// Apply all pending up migrations.
    async fn up(&self) -> Result<()>;

    /// Revert the latest successfully applied version.
    async fn down(&self) -> Result<()>;

    /// Report applied and pending state without mutating it.
    async fn status(&self) -> Result<StatusReport>;
}

/// Produces the migration registry.
pub trait MigrationSource: Send + Sync {
    fn load(&self) -> Result<Registry>;
}

/// An already-built registry is its own source.
impl MigrationSource for Registry {
    fn load(&self) -> Result<Registry> {
        Ok(self.clone())
    }
}

/// Cross-process mutual exclusion for migration runs.
#[async_trait]
pub trait MigrationLock: Send + Sync {
    /// Lock key, for logging.
    fn key(&self) -> i64;

    /// Block until the lock is held.
    async fn acquire(&self) -> Result<()>;

    /// Release the lock. Callers treat failures as best-effort.
    async fn release(&self) -> Result<()>;
}

/// Persisted migration state.
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Tracking table name.
    fn table_name(&self) -> &str;

    /// Create the tracking table if it does not exist.
    async fn ensure_table(&self) -> Result<()>;

    /// All records ordered by `(applied_at, version)`.
    async fn applied(&self) -> Result<Vec<AppliedRecord>>;

    /// Successful records only, same order as [`MigrationStore::applied`].
    async fn applied_success(&self) -> Result<Vec<AppliedRecord>> {
        Ok(successful(self.applied().await?))
    }

    /// Upsert the record for `script.version`, overwriting every column.
    async fn record(&self, script: &MigrationScript, exec_ms: i32, success: bool) -> Result<()>;

    /// Open a transaction for running a script.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// A transaction opened by a [`MigrationStore`].
///
/// Dropping it without committing rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Execute raw, possibly multi-statement SQL.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Delete the tracking record for `version`, returning rows affected.
    async fn delete_record(&mut self, version: i64) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
