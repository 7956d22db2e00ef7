//! Testing utilities for SHIFT.
//!
//! In-memory fakes of the migration ports, so the engine can be exercised
//! without a database, plus explicit provisioning for PostgreSQL
//! integration tests.

mod db;
mod lock;
mod store;

pub use db::{IsolatedTestDb, TestDatabase};
pub use lock::{LockEvent, MemoryLock};
pub use store::{MemoryStore, StoreCall};
