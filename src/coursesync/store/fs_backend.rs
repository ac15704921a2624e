use super::backend::StorageBackend;
use crate::error::{Result, SyncError};
use crate::model::Structure;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const STRUCTURE_FILE: &str = "structure.json";

pub struct FsBackend {
    root: PathBuf,
    commit_lock: Mutex<()>,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn structure_path(&self) -> PathBuf {
        self.root.join(STRUCTURE_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(SyncError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self) -> Result<Structure> {
        let path = self.structure_path();
        if !path.exists() {
            return Ok(Structure::default());
        }
        let content = fs::read_to_string(path).map_err(SyncError::Io)?;
        let structure: Structure =
            serde_json::from_str(&content).map_err(SyncError::Serialization)?;
        Ok(structure)
    }

    fn commit(&self, structure: &Structure, expected_revision: u64) -> Result<()> {
        let _guard = self.commit_lock.lock();
        self.ensure_dir()?;

        // Another process may have committed since our load.
        let current = self.load()?.revision;
        if current != expected_revision {
            return Err(SyncError::Conflict(format!(
                "{} moved from revision {} to {}",
                STRUCTURE_FILE, expected_revision, current
            )));
        }

        let content = serde_json::to_string_pretty(structure).map_err(SyncError::Serialization)?;

        write_atomically(&self.root, &self.structure_path(), &content)
    }
}

/// Write `content` to a temp file in `dir`, then rename it over `target`.
/// The temp file is removed again if either step fails.
fn write_atomically(dir: &Path, target: &Path, content: &str) -> Result<()> {
    let tmp_file = dir.join(format!(".structure-{}.tmp", Uuid::new_v4()));
    let written = fs::write(&tmp_file, content).and_then(|_| fs::rename(&tmp_file, target));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_file);
        return Err(SyncError::Io(e));
    }
    Ok(())
}
