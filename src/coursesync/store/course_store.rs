use super::backend::StorageBackend;
use super::StructureStore;
use crate::error::Result;
use crate::model::Structure;
use parking_lot::Mutex;
use tracing::warn;

pub struct CourseStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    /// Serializes writers sharing this store, so in-process callers queue
    /// instead of conflicting.
    write_lock: Mutex<()>,
}

impl<B: StorageBackend> CourseStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }
}

impl<B: StorageBackend> StructureStore for CourseStore<B> {
    fn snapshot(&self) -> Result<Structure> {
        self.backend.load()
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Structure) -> Result<T>,
    {
        self.transact_then(f, |_| Ok(()))
    }

    fn transact_then<T, F, G>(&self, f: F, finish: G) -> Result<T>
    where
        F: FnOnce(&mut Structure) -> Result<T>,
        G: FnOnce(&T) -> Result<()>,
    {
        let _guard = self.write_lock.lock();

        let mut working = self.backend.load()?;
        let base = working.revision;
        let output = f(&mut working)?;

        working.revision = base + 1;
        if let Err(e) = self.backend.commit(&working, base) {
            warn!(revision = base, error = %e, "transaction aborted");
            return Err(e);
        }
        if let Err(e) = finish(&output) {
            warn!(revision = base + 1, error = %e, "post-commit step failed");
            return Err(e);
        }
        Ok(output)
    }
}
