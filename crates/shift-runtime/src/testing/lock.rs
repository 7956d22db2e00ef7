//! In-memory migration lock.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use shift_core::config::DEFAULT_LOCK_KEY;
use shift_core::error::{Result, ShiftError};
use shift_core::migration::MigrationLock;

/// Lock transitions, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    Acquired,
    Released,
    AcquireFailed,
}

#[derive(Default)]
struct State {
    held: bool,
    fail_acquire: bool,
    fail_release: bool,
    events: Vec<LockEvent>,
}

/// In-memory [`MigrationLock`] that records every transition.
#[derive(Clone)]
pub struct MemoryLock {
    key: i64,
    state: Arc<Mutex<State>>,
}

impl Default for MemoryLock {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_KEY)
    }
}

impl MemoryLock {
    pub fn new(key: i64) -> Self {
        Self {
            key,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn fail_acquire(&self, fail: bool) {
        self.state.lock().unwrap().fail_acquire = fail;
    }

    /// Release reports an error but still lets go of the lock.
    pub fn fail_release(&self, fail: bool) {
        self.state.lock().unwrap().fail_release = fail;
    }

    pub fn is_held(&self) -> bool {
        self.state.lock().unwrap().held
    }

    pub fn events(&self) -> Vec<LockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn acquire_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == LockEvent::Acquired)
            .count()
    }
}

#[async_trait]
impl MigrationLock for MemoryLock {
    fn key(&self) -> i64 {
        self.key
    }

    async fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_acquire {
            state.events.push(LockEvent::AcquireFailed);
            return Err(ShiftError::Lock("simulated lock failure".into()));
        }
        if state.held {
            state.events.push(LockEvent::AcquireFailed);
            return Err(ShiftError::Lock(format!("lock {} already held", self.key)));
        }
        state.held = true;
        state.events.push(LockEvent::Acquired);
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.held {
            return Ok(());
        }
        state.held = false;
        state.events.push(LockEvent::Released);
        if state.fail_release {
            return Err(ShiftError::Lock("simulated release failure".into()));
        }
        Ok(())
    }
}
