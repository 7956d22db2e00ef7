pub mod db;
pub mod migrations;
pub mod testing;

pub use db::Database;
pub use migrations::{EmbeddedBundle, Migrator, MigratorOptions, SourceAggregator};
