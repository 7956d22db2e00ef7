use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use shift_core::config::DatabaseConfig;
use shift_core::error::{Result, ShiftError};

/// Connection pool shared by the tracking store and the migration lock.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect and verify the server answers within `connect_timeout_secs`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ShiftError::Config("database url is required".into()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.max(2))
            .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
            .connect_lazy(&config.url)
            .map_err(|e| ShiftError::Database(format!("Invalid database url: {}", e)))?;

        let db = Self { pool };
        db.ping(Duration::from_secs(config.connect_timeout_secs)).await?;
        debug!("Connected to database");
        Ok(db)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check connectivity, bounded by `timeout`.
    pub async fn ping(&self, timeout: Duration) -> Result<()> {
        let check = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(timeout, check).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ShiftError::Database(format!("Failed to connect: {}", e))),
            Err(_) => Err(ShiftError::Timeout(format!(
                "database did not respond within {:?}",
                timeout
            ))),
        }
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_requires_url() {
        let err = Database::connect(&DatabaseConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ShiftError::Config(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        let err = Database::connect(&config).await.err().unwrap();
        assert!(matches!(err, ShiftError::Database(_)));
    }
}
