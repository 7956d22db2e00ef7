//! Versioned SQL migrations.
//!
//! Scripts are loaded from directories and embedded bundles, applied in
//! version order under a cross-process lock, and tracked in a table with
//! one row per version.

mod lock;
mod plan;
mod runner;
mod source;
mod store;

pub use lock::PgAdvisoryLock;
pub use runner::{Migrator, MigratorOptions};
pub use source::{EmbeddedBundle, SourceAggregator};
pub use store::{quote_ident, PgMigrationStore};
