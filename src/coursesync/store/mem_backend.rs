use super::backend::StorageBackend;
use crate::error::{Result, SyncError};
use crate::model::Structure;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory storage backend for testing.
///
/// Clones share the same state, which lets tests hand one backend to several
/// stores (or threads) and observe each other's commits.
#[derive(Clone, Default)]
pub struct MemBackend {
    state: Arc<RwLock<Structure>>,
    simulate_write_error: Arc<AtomicBool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Current committed revision.
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }
}

impl StorageBackend for MemBackend {
    fn load(&self) -> Result<Structure> {
        Ok(self.state.read().clone())
    }

    fn commit(&self, structure: &Structure, expected_revision: u64) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(SyncError::Store("Simulated write error".to_string()));
        }
        let mut state = self.state.write();
        if state.revision != expected_revision {
            return Err(SyncError::Conflict(format!(
                "store moved from revision {} to {}",
                expected_revision, state.revision
            )));
        }
        *state = structure.clone();
        Ok(())
    }
}
