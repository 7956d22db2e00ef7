//! PostgreSQL advisory lock.
//!
//! Advisory locks are session-scoped, so the lock is taken on one dedicated
//! connection that is held until release. That connection is never returned
//! to the pool: it is closed on release, on unlock failure, or when an
//! acquire is cancelled mid-wait. Ending the session drops the lock.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgPool, Postgres};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use shift_core::error::{Result, ShiftError};
use shift_core::migration::MigrationLock;

/// Session-level `pg_advisory_lock` keyed by a 64-bit integer.
pub struct PgAdvisoryLock {
    pool: PgPool,
    key: i64,
    conn: Mutex<Option<PoolConnection<Postgres>>>,
}

impl PgAdvisoryLock {
    pub fn new(pool: PgPool, key: i64) -> Self {
        Self {
            pool,
            key,
            conn: Mutex::new(None),
        }
    }

    /// Whether this instance currently holds the lock.
    pub async fn is_held(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

#[async_trait]
impl MigrationLock for PgAdvisoryLock {
    fn key(&self) -> i64 {
        self.key
    }

    async fn acquire(&self) -> Result<()> {
        let mut slot = self.conn.lock().await;
        if slot.is_some() {
            return Err(ShiftError::Lock(format!(
                "advisory lock {} is already held by this migrator",
                self.key
            )));
        }

        debug!("Acquiring migration lock {}...", self.key);
        let mut conn = self.pool.acquire().await.map_err(|e| {
            ShiftError::Lock(format!("Failed to get a connection for the lock: {}", e))
        })?;
        // A cancelled wait must not hand a session that may still be granted
        // the lock back to the pool.
        conn.close_on_drop();
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(self.key)
            .execute(&mut *conn)
            .await
            .map_err(|e| ShiftError::Lock(format!("Failed to acquire migration lock: {}", e)))?;

        *slot = Some(conn);
        debug!("Migration lock acquired");
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        let Some(mut conn) = self.conn.lock().await.take() else {
            return Ok(());
        };

        let unlocked: std::result::Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
                .bind(self.key)
                .fetch_one(&mut *conn)
                .await;

        match unlocked {
            Ok(true) => {
                debug!("Migration lock released");
                Ok(())
            }
            Ok(false) => {
                warn!("Migration lock {} was not held at release", self.key);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to release migration lock, closing its session: {}", e);
                if let Err(close_err) = conn.detach().close().await {
                    debug!("Closing lock session failed: {}", close_err);
                }
                Err(ShiftError::Lock(format!(
                    "Failed to release migration lock: {}",
                    e
                )))
            }
        }
    }
}
