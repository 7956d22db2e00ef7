pub mod config;
pub mod error;
pub mod migration;

pub use config::ShiftConfig;
pub use error::{Result, ShiftError};
pub use migration::{
    AppliedRecord, Direction, Migrate, MigrationLock, MigrationScript, MigrationSource,
    MigrationStore, Registry, StatusReport, StoreTransaction,
};
