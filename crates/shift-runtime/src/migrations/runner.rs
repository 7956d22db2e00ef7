//! Migration runner with cross-process locking.
//!
//! `up` and `down` run under the migration lock so only one process mutates
//! the schema at a time. `status` is read-only and takes no lock.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use shift_core::config::{MigrationsConfig, DEFAULT_LOCK_KEY, DEFAULT_TABLE, DEFAULT_TIMEOUT_SECS};
use shift_core::error::{Result, ShiftError};
use shift_core::migration::{
    Direction, Migrate, MigrationLock, MigrationScript, MigrationSource, MigrationStore, Registry,
    StatusReport, StoreTransaction,
};

use super::lock::PgAdvisoryLock;
use super::plan;
use super::source::SourceAggregator;
use super::store::PgMigrationStore;

/// Runner options.
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    /// Tracking table name.
    pub table: String,
    /// Advisory lock key.
    pub lock_key: i64,
    /// Enable `down`.
    pub allow_down: bool,
    /// Internal bound for one run, independent of any caller deadline.
    pub timeout: Duration,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            lock_key: DEFAULT_LOCK_KEY,
            allow_down: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl MigratorOptions {
    /// Replace empty or zero values with defaults.
    fn normalized(mut self) -> Self {
        if self.table.trim().is_empty() {
            self.table = DEFAULT_TABLE.to_string();
        }
        if self.lock_key == 0 {
            self.lock_key = DEFAULT_LOCK_KEY;
        }
        if self.timeout.is_zero() {
            self.timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        }
        self
    }
}

impl From<&MigrationsConfig> for MigratorOptions {
    fn from(config: &MigrationsConfig) -> Self {
        Self {
            table: config.table.clone(),
            lock_key: config.lock_key,
            allow_down: config.allow_down,
            timeout: Duration::from_secs(config.timeout_secs),
        }
        .normalized()
    }
}

/// Applies and reverts migrations against a [`MigrationStore`].
pub struct Migrator {
    store: Arc<dyn MigrationStore>,
    lock: Arc<dyn MigrationLock>,
    source: Arc<dyn MigrationSource>,
    registry: OnceCell<Arc<Registry>>,
    options: MigratorOptions,
}

impl Migrator {
    pub fn new(
        store: Arc<dyn MigrationStore>,
        lock: Arc<dyn MigrationLock>,
        source: Arc<dyn MigrationSource>,
        options: MigratorOptions,
    ) -> Self {
        Self {
            store,
            lock,
            source,
            registry: OnceCell::new(),
            options: options.normalized(),
        }
    }

    /// PostgreSQL tracking table and advisory lock on `pool`.
    pub fn postgres(pool: PgPool, source: SourceAggregator, options: MigratorOptions) -> Self {
        let options = options.normalized();
        let store = PgMigrationStore::new(pool.clone(), options.table.clone());
        let lock = PgAdvisoryLock::new(pool, options.lock_key);
        Self::new(Arc::new(store), Arc::new(lock), Arc::new(source), options)
    }

    pub fn options(&self) -> &MigratorOptions {
        &self.options
    }

    /// The registry, loaded from the source on first use.
    pub async fn registry(&self) -> Result<Arc<Registry>> {
        let registry = self
            .registry
            .get_or_try_init(|| async {
                let registry = self.source.load()?;
                debug!("Loaded {} migration scripts", registry.len());
                Ok::<_, ShiftError>(Arc::new(registry))
            })
            .await?;
        Ok(Arc::clone(registry))
    }

    /// Apply all pending up migrations.
    pub async fn up(&self) -> Result<()> {
        // Source errors abort before the lock or the table is touched.
        let registry = self.registry().await?;

        self.locked("up", async {
            self.store.ensure_table().await?;
            let applied = self.store.applied().await?;
            debug!("Already applied migrations: {}", applied.len());

            let pending = plan::pending_up(&registry, &applied)?;
            if pending.is_empty() {
                info!("migrations up-to-date");
                return Ok(());
            }

            info!("{} pending migration(s)", pending.len());
            for script in pending {
                self.apply_one(script).await?;
            }
            Ok(())
        })
        .await
    }

    /// Revert the latest successfully applied version.
    pub async fn down(&self) -> Result<()> {
        if !self.options.allow_down {
            return Err(ShiftError::DownDisabled);
        }
        let registry = self.registry().await?;

        self.locked("down", async {
            self.store.ensure_table().await?;
            let applied = self.store.applied_success().await?;

            let Some(latest) = applied.iter().max_by_key(|r| r.version) else {
                info!("no successful migrations to revert");
                return Ok(());
            };

            let script = registry
                .find(latest.version, Direction::Down)
                .ok_or_else(|| ShiftError::NoDownMigration {
                    version: latest.version,
                    name: latest.name.clone(),
                })?;

            self.revert_one(script).await
        })
        .await
    }

    /// Report applied and pending state.
    pub async fn status(&self) -> Result<StatusReport> {
        let registry = self.registry().await?;

        self.bounded("status", async {
            self.store.ensure_table().await?;
            let applied = self.store.applied().await?;
            let available = plan::inspect(&registry, &applied);
            Ok(StatusReport {
                table: self.store.table_name().to_string(),
                applied,
                available,
            })
        })
        .await
    }

    /// Run `work` while holding the migration lock.
    ///
    /// Once acquired, the lock is released whatever the outcome. Release
    /// failures are only logged since closing the session also frees the lock.
    async fn locked<T>(&self, op: &str, work: impl Future<Output = Result<T>>) -> Result<T> {
        let mut acquired = false;
        let result = self
            .bounded(op, async {
                self.lock.acquire().await?;
                acquired = true;
                debug!("Holding migration lock {} for {}", self.lock.key(), op);
                work.await
            })
            .await;

        // A failed acquire may mean another run on this migrator holds it.
        if acquired {
            if let Err(e) = self.lock.release().await {
                warn!("Failed to release migration lock: {}", e);
            }
        }

        result
    }

    async fn bounded<T>(&self, op: &str, work: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.options.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(ShiftError::Timeout(format!(
                "migration {} exceeded {:?}",
                op, self.options.timeout
            ))),
        }
    }

    async fn apply_one(&self, script: &MigrationScript) -> Result<()> {
        info!("Applying migration: {} {}", script.version, script.name);

        let mut tx = self.store.begin().await?;
        let start = Instant::now();
        let executed = tx.execute(&script.sql).await;
        let exec_ms = elapsed_ms(start);

        if let Err(e) = executed {
            rollback(tx, script.version).await;
            self.record_failure(script, exec_ms).await;
            return Err(ShiftError::Execution {
                version: script.version,
                name: script.name.clone(),
                message: e.to_string(),
            });
        }

        if let Err(e) = tx.commit().await {
            self.record_failure(script, exec_ms).await;
            return Err(e);
        }

        self.store.record(script, exec_ms, true).await?;
        info!(
            "Migration applied: {} {} ({} ms)",
            script.version, script.name, exec_ms
        );
        Ok(())
    }

    /// Persist a failed attempt. The original error is what the caller sees.
    async fn record_failure(&self, script: &MigrationScript, exec_ms: i32) {
        if let Err(e) = self.store.record(script, exec_ms, false).await {
            warn!(
                "Failed to record failed migration {}: {}",
                script.version, e
            );
        }
    }

    async fn revert_one(&self, script: &MigrationScript) -> Result<()> {
        info!("Reverting migration: {} {}", script.version, script.name);

        let mut tx = self.store.begin().await?;

        // Down SQL first, then the tracking row, in the same transaction.
        if !script.is_empty() {
            if let Err(e) = tx.execute(&script.sql).await {
                rollback(tx, script.version).await;
                return Err(ShiftError::Execution {
                    version: script.version,
                    name: script.name.clone(),
                    message: e.to_string(),
                });
            }
        }

        let deleted = match tx.delete_record(script.version).await {
            Ok(rows) => rows,
            Err(e) => {
                rollback(tx, script.version).await;
                return Err(e);
            }
        };
        if deleted != 1 {
            rollback(tx, script.version).await;
            return Err(ShiftError::Integrity(format!(
                "revert {} deleted {} rows from {}, expected 1",
                script.version,
                deleted,
                self.store.table_name()
            )));
        }

        tx.commit().await?;
        info!("Migration reverted: {} {}", script.version, script.name);
        Ok(())
    }
}

#[async_trait]
impl Migrate for Migrator {
    async fn up(&self) -> Result<()> {
        Migrator::up(self).await
    }

    async fn down(&self) -> Result<()> {
        Migrator::down(self).await
    }

    async fn status(&self) -> Result<StatusReport> {
        Migrator::status(self).await
    }
}

async fn rollback(tx: Box<dyn StoreTransaction>, version: i64) {
    if let Err(e) = tx.rollback().await {
        warn!("Rollback of migration {} failed: {}", version, e);
    }
}

fn elapsed_ms(start: Instant) -> i32 {
    i32::try_from(start.elapsed().as_millis()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LockEvent, MemoryLock, MemoryStore, StoreCall};
    use std::fs;
    use tempfile::TempDir;

    fn script(version: i64, name: &str, direction: Direction, sql: &str) -> MigrationScript {
        MigrationScript::new(version, name, direction, sql)
    }

    fn registry(scripts: Vec<MigrationScript>) -> Registry {
        Registry::from_scripts(scripts).unwrap()
    }

    fn migrator_with(
        source: impl MigrationSource + 'static,
        allow_down: bool,
    ) -> (Migrator, MemoryStore, MemoryLock) {
        let store = MemoryStore::new();
        let lock = MemoryLock::default();
        let migrator = Migrator::new(
            Arc::new(store.clone()),
            Arc::new(lock.clone()),
            Arc::new(source),
            MigratorOptions {
                allow_down,
                ..Default::default()
            },
        );
        (migrator, store, lock)
    }

    fn three_scripts() -> Registry {
        registry(vec![
            script(20240101, "users", Direction::Up, "CREATE TABLE users();"),
            script(20240101, "users", Direction::Down, "DROP TABLE users;"),
            script(20240102, "posts", Direction::Up, "CREATE TABLE posts();"),
            script(20240103, "tags", Direction::Up, "CREATE TABLE tags();"),
        ])
    }

    #[tokio::test]
    async fn test_up_applies_in_order_and_is_idempotent() {
        let (migrator, store, lock) = migrator_with(three_scripts(), false);

        migrator.up().await.unwrap();
        let records = store.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.success));
        assert!(records[0].applied_at < records[1].applied_at);
        assert!(records[1].applied_at < records[2].applied_at);
        assert_eq!(
            store.executed(),
            vec![
                "CREATE TABLE users();",
                "CREATE TABLE posts();",
                "CREATE TABLE tags();"
            ]
        );

        let writes = store.write_count();
        migrator.up().await.unwrap();
        assert_eq!(store.write_count(), writes);
        assert_eq!(store.executed().len(), 3);
        assert_eq!(lock.acquire_count(), 2);
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_up_stops_at_first_failure() {
        let (migrator, store, lock) = migrator_with(three_scripts(), false);
        store.fail_when_sql_contains("posts");

        let err = migrator.up().await.unwrap_err();
        assert!(matches!(err, ShiftError::Execution { version: 20240102, .. }));

        assert!(store.record_for(20240101).unwrap().success);
        assert!(!store.record_for(20240102).unwrap().success);
        assert!(store.record_for(20240103).is_none());
        assert_eq!(store.executed(), vec!["CREATE TABLE users();"]);
        assert!(store.calls().contains(&StoreCall::Rollback));
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_failed_version_is_retried_and_overwritten() {
        let (migrator, store, _lock) = migrator_with(three_scripts(), false);
        store.fail_when_sql_contains("posts");
        assert!(migrator.up().await.is_err());

        store.clear_failures();
        migrator.up().await.unwrap();

        let records = store.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn test_commit_failure_is_recorded() {
        let (migrator, store, _lock) = migrator_with(three_scripts(), false);
        store.fail_commits(true);

        assert!(migrator.up().await.is_err());
        assert!(!store.record_for(20240101).unwrap().success);
        assert!(store.record_for(20240102).is_none());
    }

    #[tokio::test]
    async fn test_execution_error_survives_failed_bookkeeping() {
        let (migrator, store, _lock) = migrator_with(three_scripts(), false);
        store.fail_when_sql_contains("users");
        store.fail_records(true);

        let err = migrator.up().await.unwrap_err();
        assert!(matches!(err, ShiftError::Execution { version: 20240101, .. }));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_drift_aborts_before_mutation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("20240101_users.up.sql"), "CREATE TABLE users();").unwrap();
        let first = SourceAggregator::new().with_dir(dir.path());
        let (migrator, store, _lock) = migrator_with(first, false);
        migrator.up().await.unwrap();

        // A new process sees the edited file.
        fs::write(
            dir.path().join("20240101_users.up.sql"),
            "CREATE TABLE users(id INT);",
        )
        .unwrap();
        fs::write(dir.path().join("20240102_posts.up.sql"), "CREATE TABLE posts();").unwrap();
        let rerun = Migrator::new(
            Arc::new(store.clone()),
            Arc::new(MemoryLock::default()),
            Arc::new(SourceAggregator::new().with_dir(dir.path())),
            MigratorOptions::default(),
        );

        let writes = store.write_count();
        let err = rerun.up().await.unwrap_err();
        assert!(matches!(err, ShiftError::Drift { version: 20240101, .. }));
        assert_eq!(store.write_count(), writes);
        assert!(store.record_for(20240102).is_none());
    }

    #[tokio::test]
    async fn test_registry_is_cached() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("20240101_users.up.sql"), "CREATE TABLE users();").unwrap();
        let (migrator, store, _lock) =
            migrator_with(SourceAggregator::new().with_dir(dir.path()), false);

        assert_eq!(migrator.registry().await.unwrap().len(), 1);
        fs::write(dir.path().join("20240102_posts.up.sql"), "CREATE TABLE posts();").unwrap();
        migrator.up().await.unwrap();

        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sources_fail_before_lock() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("20240101_a.up.sql"), "SELECT 1;").unwrap();
        fs::write(second.path().join("20240101_b.up.sql"), "SELECT 2;").unwrap();
        let source = SourceAggregator::new().with_dirs([first.path(), second.path()]);
        let (migrator, store, lock) = migrator_with(source, true);

        let err = migrator.up().await.unwrap_err();
        assert!(matches!(err, ShiftError::Duplicate { .. }));
        assert!(lock.events().is_empty());
        assert!(!store.touched());

        assert!(migrator.down().await.unwrap_err().is_load_error());
        assert!(migrator.status().await.unwrap_err().is_load_error());
        assert!(lock.events().is_empty());
        assert!(!store.touched());
    }

    #[tokio::test]
    async fn test_lock_failure_has_no_side_effects() {
        let (migrator, store, lock) = migrator_with(three_scripts(), false);
        lock.fail_acquire(true);

        let err = migrator.up().await.unwrap_err();
        assert!(matches!(err, ShiftError::Lock(_)));
        assert!(!store.touched());
        assert_eq!(lock.events(), vec![LockEvent::AcquireFailed]);
    }

    #[tokio::test]
    async fn test_release_failure_does_not_mask_result() {
        let (migrator, store, lock) = migrator_with(three_scripts(), false);
        lock.fail_release(true);

        migrator.up().await.unwrap();
        assert_eq!(store.records().len(), 3);
        assert_eq!(lock.events(), vec![LockEvent::Acquired, LockEvent::Released]);
    }

    #[tokio::test]
    async fn test_down_disabled() {
        let (migrator, store, lock) = migrator_with(three_scripts(), false);
        migrator.up().await.unwrap();
        let before = store.records();
        let calls = store.calls().len();

        let err = migrator.down().await.unwrap_err();
        assert!(matches!(err, ShiftError::DownDisabled));
        assert_eq!(store.records(), before);
        assert_eq!(store.calls().len(), calls);
        assert_eq!(lock.acquire_count(), 1);
    }

    #[tokio::test]
    async fn test_down_without_down_script() {
        let (migrator, store, lock) = migrator_with(three_scripts(), true);
        migrator.up().await.unwrap();
        let writes = store.write_count();

        let err = migrator.down().await.unwrap_err();
        match err {
            ShiftError::NoDownMigration { version, name } => {
                assert_eq!(version, 20240103);
                assert_eq!(name, "tags");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.write_count(), writes);
        assert_eq!(store.records().len(), 3);
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_down_reverts_latest_version() {
        let registry = registry(vec![
            script(20240101, "users", Direction::Up, "CREATE TABLE users();"),
            script(20240101, "users", Direction::Down, "DROP TABLE users;"),
            script(20240102, "posts", Direction::Up, "CREATE TABLE posts();"),
            script(20240102, "posts", Direction::Down, "DROP TABLE posts;"),
        ]);
        let (migrator, store, _lock) = migrator_with(registry, true);
        migrator.up().await.unwrap();

        migrator.down().await.unwrap();
        assert!(store.record_for(20240102).is_none());
        assert!(store.record_for(20240101).is_some());
        assert_eq!(store.executed().last().unwrap(), "DROP TABLE posts;");

        migrator.down().await.unwrap();
        assert!(store.records().is_empty());

        // Nothing left to revert.
        migrator.down().await.unwrap();

        // Reverted versions are pending again.
        migrator.up().await.unwrap();
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_down_skips_failed_latest() {
        let registry = registry(vec![
            script(20240101, "users", Direction::Up, "CREATE TABLE users();"),
            script(20240101, "users", Direction::Down, "DROP TABLE users;"),
            script(20240102, "posts", Direction::Up, "CREATE TABLE posts();"),
        ]);
        let (migrator, store, _lock) = migrator_with(registry, true);
        store.fail_when_sql_contains("posts");
        assert!(migrator.up().await.is_err());

        migrator.down().await.unwrap();
        assert!(store.record_for(20240101).is_none());
        assert!(!store.record_for(20240102).unwrap().success);
    }

    #[tokio::test]
    async fn test_down_with_empty_script_only_deletes_record() {
        let registry = registry(vec![
            script(20240101, "seed", Direction::Up, "INSERT INTO t VALUES (1);"),
            script(20240101, "seed", Direction::Down, "   \n"),
        ]);
        let (migrator, store, _lock) = migrator_with(registry, true);
        migrator.up().await.unwrap();

        migrator.down().await.unwrap();
        assert!(store.records().is_empty());
        assert_eq!(store.executed(), vec!["INSERT INTO t VALUES (1);"]);
    }

    #[tokio::test]
    async fn test_down_unexpected_row_count_rolls_back() {
        let registry = registry(vec![
            script(20240101, "users", Direction::Up, "CREATE TABLE users();"),
            script(20240101, "users", Direction::Down, "DROP TABLE users;"),
        ]);
        let (migrator, store, lock) = migrator_with(registry, true);
        migrator.up().await.unwrap();
        store.override_delete_count(2);

        let err = migrator.down().await.unwrap_err();
        assert!(matches!(err, ShiftError::Integrity(_)));
        assert!(store.record_for(20240101).is_some());
        assert_eq!(store.executed(), vec!["CREATE TABLE users();"]);
        assert_eq!(store.calls().last(), Some(&StoreCall::Rollback));
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_status_is_read_only() {
        let (migrator, store, lock) = migrator_with(three_scripts(), false);
        store.fail_when_sql_contains("posts");
        let _ = migrator.up().await;

        let before = store.records();
        let writes = store.write_count();
        let events = lock.events();

        let report = migrator.status().await.unwrap();
        assert_eq!(report.table, "schema_migrations");
        assert_eq!(report.applied.len(), 2);
        let pending: Vec<_> = report.pending().map(|s| s.version).collect();
        assert_eq!(pending, vec![20240102, 20240103]);
        assert!(report.to_string().contains("* 20240102 posts"));

        assert_eq!(store.records(), before);
        assert_eq!(store.write_count(), writes);
        assert_eq!(lock.events(), events);
    }

    #[tokio::test]
    async fn test_status_reports_drift_instead_of_failing() {
        let (migrator, store, _lock) = migrator_with(three_scripts(), false);
        migrator.up().await.unwrap();
        let mut record = store.record_for(20240102).unwrap();
        record.checksum = "tampered".into();
        store.seed(record);

        let report = migrator.status().await.unwrap();
        let drifted: Vec<_> = report.drifted().map(|s| s.version).collect();
        assert_eq!(drifted, vec![20240102]);
        assert!(migrator.up().await.is_err());
    }

    #[tokio::test]
    async fn test_migrate_trait_object() {
        let (migrator, store, _lock) = migrator_with(three_scripts(), false);
        let migrate: Box<dyn Migrate> = Box::new(migrator);

        migrate.up().await.unwrap();
        assert!(migrate.status().await.unwrap().is_up_to_date());
        assert!(matches!(
            migrate.down().await.unwrap_err(),
            ShiftError::DownDisabled
        ));
        assert_eq!(store.records().len(), 3);
    }

    /// Delays `ensure_table`, so a run can be caught while it holds the lock.
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl MigrationStore for SlowStore {
        fn table_name(&self) -> &str {
            self.inner.table_name()
        }
        async fn ensure_table(&self) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.ensure_table().await
        }
        async fn applied(&self) -> Result<Vec<shift_core::AppliedRecord>> {
            self.inner.applied().await
        }
        async fn record(&self, s: &MigrationScript, ms: i32, ok: bool) -> Result<()> {
            self.inner.record(s, ms, ok).await
        }
        async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
            self.inner.begin().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_internal_timeout() {
        let lock = MemoryLock::default();
        let migrator = Migrator::new(
            Arc::new(SlowStore {
                inner: MemoryStore::new(),
                delay: Duration::from_secs(3600),
            }),
            Arc::new(lock.clone()),
            Arc::new(three_scripts()),
            MigratorOptions {
                timeout: Duration::from_secs(5),
                ..Default::default()
            },
        );

        let err = migrator.up().await.unwrap_err();
        assert!(matches!(err, ShiftError::Timeout(_)));
        assert!(!lock.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_acquire_keeps_other_run_locked() {
        let store = MemoryStore::new();
        let lock = MemoryLock::default();
        let migrator = Migrator::new(
            Arc::new(SlowStore {
                inner: store.clone(),
                delay: Duration::from_millis(100),
            }),
            Arc::new(lock.clone()),
            Arc::new(three_scripts()),
            MigratorOptions::default(),
        );

        let first = migrator.up();
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let err = migrator.up().await.unwrap_err();
            assert!(matches!(err, ShiftError::Lock(_)));
            // The first run is still inside ensure_table.
            assert!(lock.is_held());
        };
        let (first, ()) = tokio::join!(first, second);
        first.unwrap();

        assert_eq!(
            lock.events(),
            vec![
                LockEvent::Acquired,
                LockEvent::AcquireFailed,
                LockEvent::Released
            ]
        );
        assert!(!lock.is_held());
        assert_eq!(store.records().len(), 3);
    }

    #[test]
    fn test_options_from_config() {
        let config = MigrationsConfig {
            table: String::new(),
            lock_key: 0,
            allow_down: true,
            timeout_secs: 0,
            ..Default::default()
        };
        let options = MigratorOptions::from(&config);
        assert_eq!(options.table, DEFAULT_TABLE);
        assert_eq!(options.lock_key, DEFAULT_LOCK_KEY);
        assert!(options.allow_down);
        assert_eq!(options.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
