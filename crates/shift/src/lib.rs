//! SHIFT - versioned SQL schema migrations for PostgreSQL.
//!
//! The `shift` binary drives the engine from the command line. Host
//! applications embed it through [`shift_runtime::Migrator`] and the
//! [`Migrate`] trait.

pub mod cli;

pub use shift_core::{Migrate, ShiftConfig, ShiftError, StatusReport};
pub use shift_runtime::{Database, EmbeddedBundle, Migrator, MigratorOptions, SourceAggregator};
