//! # Content Store
//!
//! Uploaded files are owned by an external content store. Callers first stage
//! files into a numbered **draft area** (the `upload_ref` of the wire
//! operations), then reference that draft when creating a file resource or a
//! folder.
//!
//! Instance file areas are only ever replaced as a whole, and only after the
//! structure transaction that records their file list has committed:
//!
//! 1. [`ContentStore::stage_area`] builds the new contents of an area (what is
//!    there now, overlaid with the draft) under a private staging name. The
//!    live area is not touched.
//! 2. [`ContentStore::publish`] swaps the staged copy in once the commit went
//!    through.
//! 3. [`ContentStore::abandon`] drops the staged copy when it did not.
//!
//! Area names come from instance ids, which a stale transaction may hand out a
//! second time. Because a writer that loses the commit never publishes, it can
//! not clobber the area of the writer that won.

use crate::error::Result;
use crate::model::{DraftId, ElementKind, InstanceId, StoredFile};
use std::fmt;
use uuid::Uuid;

pub mod fs;
pub mod memory;

/// The file area belonging to one kind instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileArea {
    pub kind: ElementKind,
    pub instance: InstanceId,
}

impl FileArea {
    pub fn new(kind: ElementKind, instance: InstanceId) -> Self {
        Self { kind, instance }
    }
}

impl fmt::Display for FileArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.instance)
    }
}

/// New contents of a file area, staged but not yet visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArea {
    pub token: Uuid,
    pub area: FileArea,
    /// Full file list the area will have once published.
    pub files: Vec<StoredFile>,
}

pub trait ContentStore {
    /// Files staged in `draft`, sorted by path.
    /// Fails with `Validation` when the draft does not exist.
    fn draft_files(&self, draft: DraftId) -> Result<Vec<StoredFile>>;

    /// Stage the current contents of `area` overlaid with the draft.
    /// Same paths take the draft's copy.
    fn stage_area(&self, draft: DraftId, area: FileArea) -> Result<StagedArea>;

    /// Replace the live area with a staged copy.
    fn publish(&self, staged: &StagedArea) -> Result<()>;

    /// Drop a staged copy. Already published or missing copies are not an error.
    fn abandon(&self, staged: &StagedArea) -> Result<()>;
}

/// Normalize a staged path to the `/dir/file` form used in file lists.
pub(crate) fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');
    format!("/{}", trimmed.replace('\\', "/"))
}
