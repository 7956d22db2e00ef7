//! PostgreSQL-backed tracking table.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use shift_core::error::{Result, ShiftError};
use shift_core::migration::{AppliedRecord, MigrationScript, MigrationStore, StoreTransaction};

/// Tracking table stored in PostgreSQL.
#[derive(Clone)]
pub struct PgMigrationStore {
    pool: PgPool,
    table: String,
    queries: Queries,
}

/// SQL text for a given table, built once.
#[derive(Debug, Clone)]
struct Queries {
    create: String,
    select: String,
    upsert: String,
    delete: String,
}

impl Queries {
    fn for_table(table: &str) -> Self {
        let t = quote_ident(table);
        Self {
            create: format!(
                r#"
                CREATE TABLE IF NOT EXISTS {t} (
                    version BIGINT PRIMARY KEY,
                    name TEXT NOT NULL,
                    checksum TEXT NOT NULL,
                    applied_at TIMESTAMPTZ NOT NULL,
                    exec_ms INTEGER NOT NULL,
                    success BOOLEAN NOT NULL
                )
                "#
            ),
            select: format!(
                r#"
                SELECT version, name, checksum, applied_at, exec_ms, success
                FROM {t}
                ORDER BY applied_at ASC, version ASC
                "#
            ),
            upsert: format!(
                r#"
                INSERT INTO {t} (version, name, checksum, applied_at, exec_ms, success)
                VALUES ($1, $2, $3, NOW(), $4, $5)
                ON CONFLICT (version) DO UPDATE SET
                    name = EXCLUDED.name,
                    checksum = EXCLUDED.checksum,
                    applied_at = EXCLUDED.applied_at,
                    exec_ms = EXCLUDED.exec_ms,
                    success = EXCLUDED.success
                "#
            ),
            delete: format!("DELETE FROM {t} WHERE version = $1"),
        }
    }
}

impl PgMigrationStore {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        let table = table.into();
        let queries = Queries::for_table(&table);
        Self {
            pool,
            table,
            queries,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MigrationStore for PgMigrationStore {
    fn table_name(&self) -> &str {
        &self.table
    }

    async fn ensure_table(&self) -> Result<()> {
        sqlx::query(&self.queries.create)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                ShiftError::Database(format!("Failed to create migrations table: {}", e))
            })?;
        Ok(())
    }

    async fn applied(&self) -> Result<Vec<AppliedRecord>> {
        sqlx::query_as::<_, AppliedRecord>(&self.queries.select)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ShiftError::Database(format!("Failed to get applied migrations: {}", e)))
    }

    async fn record(&self, script: &MigrationScript, exec_ms: i32, success: bool) -> Result<()> {
        sqlx::query(&self.queries.upsert)
            .bind(script.version)
            .bind(&script.name)
            .bind(&script.checksum)
            .bind(exec_ms)
            .bind(success)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                ShiftError::Database(format!(
                    "Failed to record migration {}: {}",
                    script.version, e
                ))
            })?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            ShiftError::Database(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(Box::new(PgStoreTransaction {
            tx,
            delete: self.queries.delete.clone(),
        }))
    }
}

/// A PostgreSQL transaction running one script.
struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
    delete: String,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        // Simple query protocol, so scripts may hold several statements.
        let conn: &mut sqlx::PgConnection = &mut self.tx;
        sqlx::Executor::execute(conn, sqlx::raw_sql(sql)).await?;
        Ok(())
    }

    async fn delete_record(&mut self, version: i64) -> Result<u64> {
        let result = sqlx::query(&self.delete)
            .bind(version)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
