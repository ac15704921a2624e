use super::{normalize_path, ContentStore, FileArea, StagedArea};
use crate::error::{Result, SyncError};
use crate::model::{DraftId, StoredFile};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

type Files = BTreeMap<String, Vec<u8>>;

/// In-memory content store for testing. Clones share state.
#[derive(Clone, Default)]
pub struct MemContentStore {
    drafts: Arc<RwLock<HashMap<DraftId, Files>>>,
    areas: Arc<RwLock<HashMap<FileArea, Files>>>,
    staging: Arc<RwLock<HashMap<Uuid, Files>>>,
}

impl MemContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty draft (a valid, file-less upload reference).
    pub fn create_draft(&self, draft: DraftId) {
        self.drafts.write().entry(draft).or_default();
    }

    /// Stage one file into a draft, creating the draft if needed.
    pub fn stage(&self, draft: DraftId, path: &str, bytes: &[u8]) {
        self.drafts
            .write()
            .entry(draft)
            .or_default()
            .insert(normalize_path(path), bytes.to_vec());
    }

    pub fn area_files(&self, area: FileArea) -> Vec<StoredFile> {
        self.areas
            .read()
            .get(&area)
            .map(listing)
            .unwrap_or_default()
    }

    /// Number of staged copies neither published nor abandoned.
    pub fn pending_stages(&self) -> usize {
        self.staging.read().len()
    }
}

fn listing(files: &Files) -> Vec<StoredFile> {
    files
        .iter()
        .map(|(path, bytes)| StoredFile {
            path: path.clone(),
            size: bytes.len() as u64,
        })
        .collect()
}

impl ContentStore for MemContentStore {
    fn draft_files(&self, draft: DraftId) -> Result<Vec<StoredFile>> {
        self.drafts
            .read()
            .get(&draft)
            .map(listing)
            .ok_or_else(|| SyncError::validation(format!("upload area {} does not exist", draft)))
    }

    fn stage_area(&self, draft: DraftId, area: FileArea) -> Result<StagedArea> {
        let upload = self
            .drafts
            .read()
            .get(&draft)
            .cloned()
            .ok_or_else(|| SyncError::validation(format!("upload area {} does not exist", draft)))?;

        let mut merged = self.areas.read().get(&area).cloned().unwrap_or_default();
        merged.extend(upload);
        let files = listing(&merged);

        let token = Uuid::new_v4();
        self.staging.write().insert(token, merged);
        Ok(StagedArea { token, area, files })
    }

    fn publish(&self, staged: &StagedArea) -> Result<()> {
        let files = self.staging.write().remove(&staged.token).ok_or_else(|| {
            SyncError::Store(format!("staged copy of area {} is gone", staged.area))
        })?;
        self.areas.write().insert(staged.area, files);
        Ok(())
    }

    fn abandon(&self, staged: &StagedArea) -> Result<()> {
        self.staging.write().remove(&staged.token);
        Ok(())
    }
}
