//! # Storage Layer
//!
//! The structure store is an external collaborator: the core reads and writes
//! through the [`StructureStore`] trait and never assumes how records are kept.
//!
//! ## Transaction Discipline
//!
//! Every mutation runs inside [`StructureStore::transact`]:
//!
//! 1. The store loads the committed [`Structure`] and hands the closure a
//!    private, mutable copy.
//! 2. The closure validates and mutates the copy. Returning `Err` discards it;
//!    nothing is written.
//! 3. The store commits the copy as a whole, but only if no other commit
//!    happened since step 1 (revision check). Otherwise the call fails with
//!    `Conflict` and the caller may retry.
//!
//! [`StructureStore::transact_then`] adds a fourth step: once the commit went
//! through, a `finish` hook runs before the next writer on the same handle may
//! start. Commands use it to publish file areas in commit order.
//!
//! Readers use [`StructureStore::snapshot`], which only ever returns a
//! committed state. Section shifts and element moves are therefore observed
//! either completely or not at all.
//!
//! ## Backend Split
//!
//! [`CourseStore`] implements the transaction logic once, on top of a
//! [`backend::StorageBackend`] that only knows how to load and atomically
//! replace the record set:
//!
//! - [`mem_backend::MemBackend`]: in-memory, shareable across threads (tests).
//! - [`fs_backend::FsBackend`]: `structure.json` in the data directory.
//!
//! ```text
//! <data_dir>/
//! ├── structure.json     # courses, sections, elements, instances, counters
//! └── coursesync.toml    # configuration (optional)
//! ```

use crate::error::Result;
use crate::model::Structure;

pub mod backend;
pub mod course_store;
pub mod fs_backend;
pub mod mem_backend;

pub use course_store::CourseStore;

/// Abstract interface for the persistent record store.
pub trait StructureStore {
    /// Read the latest committed state.
    fn snapshot(&self) -> Result<Structure>;

    /// Run `f` against a private copy of the state and commit it atomically.
    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Structure) -> Result<T>;

    /// Like [`transact`](Self::transact), then run `finish` on the committed
    /// value. `finish` never runs when the transaction did not commit.
    fn transact_then<T, F, G>(&self, f: F, finish: G) -> Result<T>
    where
        F: FnOnce(&mut Structure) -> Result<T>,
        G: FnOnce(&T) -> Result<()>,
    {
        let output = self.transact(f)?;
        finish(&output)?;
        Ok(output)
    }
}
