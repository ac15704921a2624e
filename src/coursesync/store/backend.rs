use crate::error::Result;
use crate::model::Structure;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while CourseStore handles the "what" (transactions, revisions).
pub trait StorageBackend {
    /// Load the committed record set. A store that was never written yields
    /// an empty [`Structure`] at revision 0.
    fn load(&self) -> Result<Structure>;

    /// Replace the record set with `structure`.
    ///
    /// MUST fail with `Conflict` if the stored revision is no longer
    /// `expected_revision`, and MUST be atomic: a reader sees either the old
    /// or the new state, never a mix.
    fn commit(&self, structure: &Structure, expected_revision: u64) -> Result<()>;
}
