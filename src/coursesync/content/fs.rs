use super::{normalize_path, ContentStore, FileArea, StagedArea};
use crate::error::{Result, SyncError};
use crate::model::{DraftId, StoredFile};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File-based content store.
///
/// ```text
/// <root>/
/// ├── drafts/<draft-id>/...            # staged uploads
/// ├── areas/<kind>/<instance-id>/...   # committed instance files
/// └── staging/<token>/...              # area contents awaiting publish
/// ```
///
/// Publishing renames the staged directory into place. The previous area is
/// moved aside first and removed afterwards.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn draft_dir(&self, draft: DraftId) -> PathBuf {
        self.root.join("drafts").join(draft.to_string())
    }

    fn area_dir(&self, area: FileArea) -> PathBuf {
        self.root
            .join("areas")
            .join(area.kind.as_str())
            .join(area.instance.to_string())
    }

    fn staging_dir(&self, token: Uuid) -> PathBuf {
        self.root.join("staging").join(token.to_string())
    }

    /// Copy a local file into a draft under its file name.
    pub fn stage_file(&self, draft: DraftId, source: &Path) -> Result<StoredFile> {
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                SyncError::validation(format!("{} has no usable file name", source.display()))
            })?;
        let dir = self.draft_dir(draft);
        fs::create_dir_all(&dir).map_err(SyncError::Io)?;
        let size = fs::copy(source, dir.join(name)).map_err(SyncError::Io)?;
        Ok(StoredFile {
            path: normalize_path(name),
            size,
        })
    }
}

fn list_tree(root: &Path) -> Result<Vec<StoredFile>> {
    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<StoredFile>) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(SyncError::Io)? {
        let entry = entry.map_err(SyncError::Io)?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let size = entry.metadata().map_err(SyncError::Io)?.len();
            out.push(StoredFile {
                path: normalize_path(&relative.to_string_lossy()),
                size,
            });
        }
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(SyncError::Io)?;
    for entry in fs::read_dir(from).map_err(SyncError::Io)? {
        let entry = entry.map_err(SyncError::Io)?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_tree(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(SyncError::Io)?;
        }
    }
    Ok(())
}

/// Copy the live area (if any) and then the draft into `staging`.
fn fill_staging(live: &Path, draft: &Path, staging: &Path) -> Result<Vec<StoredFile>> {
    if live.is_dir() {
        copy_tree(live, staging)?;
    }
    copy_tree(draft, staging)?;
    list_tree(staging)
}

impl ContentStore for FsContentStore {
    fn draft_files(&self, draft: DraftId) -> Result<Vec<StoredFile>> {
        let dir = self.draft_dir(draft);
        if !dir.is_dir() {
            return Err(SyncError::validation(format!(
                "upload area {} does not exist",
                draft
            )));
        }
        list_tree(&dir)
    }

    fn stage_area(&self, draft: DraftId, area: FileArea) -> Result<StagedArea> {
        let source = self.draft_dir(draft);
        if !source.is_dir() {
            return Err(SyncError::validation(format!(
                "upload area {} does not exist",
                draft
            )));
        }

        let token = Uuid::new_v4();
        let staging = self.staging_dir(token);
        match fill_staging(&self.area_dir(area), &source, &staging) {
            Ok(files) => Ok(StagedArea { token, area, files }),
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                Err(e)
            }
        }
    }

    fn publish(&self, staged: &StagedArea) -> Result<()> {
        let staging = self.staging_dir(staged.token);
        let live = self.area_dir(staged.area);
        if let Some(parent) = live.parent() {
            fs::create_dir_all(parent).map_err(SyncError::Io)?;
        }

        let retired = self.root.join("staging").join(format!("{}-old", staged.token));
        let had_live = live.is_dir();
        if had_live {
            fs::rename(&live, &retired).map_err(SyncError::Io)?;
        }
        if let Err(e) = fs::rename(&staging, &live) {
            if had_live {
                let _ = fs::rename(&retired, &live);
            }
            return Err(SyncError::Io(e));
        }
        if had_live {
            fs::remove_dir_all(&retired).map_err(SyncError::Io)?;
        }
        Ok(())
    }

    fn abandon(&self, staged: &StagedArea) -> Result<()> {
        let dir = self.staging_dir(staged.token);
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(SyncError::Io)?;
        }
        Ok(())
    }
}
