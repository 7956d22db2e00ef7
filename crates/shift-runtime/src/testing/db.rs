//! Explicit database provisioning for integration tests.
//!
//! Tests read `TEST_DATABASE_URL`, never `DATABASE_URL`, so a developer's
//! `.env` cannot point a test run at a real database.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use shift_core::error::{Result, ShiftError};

/// Connection to the server named by `TEST_DATABASE_URL`.
pub struct TestDatabase {
    url: String,
}

impl TestDatabase {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Read `TEST_DATABASE_URL`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("TEST_DATABASE_URL").map_err(|_| {
            ShiftError::Database(
                "TEST_DATABASE_URL not set. Set it explicitly for database tests.".to_string(),
            )
        })?;
        Ok(Self::from_url(url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create a dedicated database for one test.
    pub async fn isolated(&self, test_name: &str) -> Result<IsolatedTestDb> {
        let db_name = unique_db_name(test_name);

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.url)
            .await?;
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name))
            .execute(&admin)
            .await?;
        admin.close().await;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&replace_db_name(&self.url, &db_name))
            .await?;

        Ok(IsolatedTestDb {
            pool,
            db_name,
            base_url: self.url.clone(),
        })
    }
}

/// A database that exists for the lifetime of a single test.
pub struct IsolatedTestDb {
    pool: PgPool,
    db_name: String,
    base_url: String,
}

impl IsolatedTestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Drop the database.
    pub async fn cleanup(self) -> Result<()> {
        self.pool.close().await;

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.base_url)
            .await?;
        let _ = sqlx::query(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1",
        )
        .bind(&self.db_name)
        .execute(&admin)
        .await;
        sqlx::query(&format!("DROP DATABASE IF EXISTS \"{}\"", self.db_name))
            .execute(&admin)
            .await?;
        Ok(())
    }
}

/// Within the 63-byte identifier limit: prefix, 16 name chars, 32 hex chars.
fn unique_db_name(test_name: &str) -> String {
    format!(
        "shift_test_{}_{}",
        sanitize_db_name(test_name),
        uuid::Uuid::new_v4().simple()
    )
}

fn sanitize_db_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .take(16)
        .collect()
}

/// Replace the database name in a connection URL.
fn replace_db_name(url: &str, new_db: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return format!("{}/{}", url, new_db);
    };
    let rest = &url[scheme_end + 3..];
    let Some(slash) = rest.find('/') else {
        return format!("{}/{}", url, new_db);
    };
    let base = &url[..scheme_end + 3 + slash + 1];
    let tail = &rest[slash + 1..];
    match tail.find('?') {
        Some(q) => format!("{}{}{}", base, new_db, &tail[q..]),
        None => format!("{}{}", base, new_db),
    }
}
