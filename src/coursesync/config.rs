//! # Configuration
//!
//! Configuration is loaded with [`confique`] from layered sources.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `COURSESYNC_DATA_DIR`, `COURSESYNC_LOG_FILTER`
//! 2. **Config file**: `--config <path>`, or `coursesync.toml` in the data directory
//! 3. **Compiled defaults**
//!
//! The data directory itself falls back to the OS data directory (via
//! `directories`) when neither the command line, the environment nor the file
//! names one.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | OS data dir | Where `structure.json` and uploaded files live |
//! | `log_filter` | `info` | `tracing` filter directive, overridden by `RUST_LOG` |
//! | `grants` | none | Static capability grants for the `GrantTable` authorizer |
//!
//! ```toml
//! log_filter = "coursesync=debug"
//!
//! [[grants]]
//! principal = "sync-bot"
//! capability = "*"
//!
//! [[grants]]
//! principal = "ta"
//! capability = "element:move"
//! course = 3
//! ```

use crate::auth::Grant;
use crate::error::{Result, SyncError};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "coursesync.toml";

/// Configuration for coursesync, stored in `coursesync.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Directory holding the structure file and content areas.
    #[config(env = "COURSESYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[config(env = "COURSESYNC_LOG_FILTER", default = "info")]
    pub log_filter: String,

    pub grants: Option<Vec<Grant>>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: "info".to_string(),
            grants: None,
        }
    }
}

impl SyncConfig {
    /// Load from the environment and `file`. A missing file is not an error.
    pub fn load(file: &Path) -> Result<Self> {
        SyncConfig::builder()
            .env()
            .file(file)
            .load()
            .map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Load from `file` only, ignoring the environment.
    pub fn load_file(file: &Path) -> Result<Self> {
        SyncConfig::builder()
            .file(file)
            .load()
            .map_err(|e| SyncError::Config(e.to_string()))
    }

    pub fn grants(&self) -> Vec<Grant> {
        self.grants.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Capability, GrantedCapability};
    use crate::model::CourseId;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = SyncConfig::load_file(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert!(config.grants().is_empty());
    }

    #[test]
    fn grants_and_filter_are_read_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
log_filter = "debug"

[[grants]]
principal = "bot"
capability = "*"

[[grants]]
principal = "ta"
capability = "element:move"
course = 3
"#,
        )
        .unwrap();

        let config = SyncConfig::load_file(&path).unwrap();
        assert_eq!(config.log_filter, "debug");
        let grants = config.grants();
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0], Grant::everything("bot"));
        assert_eq!(
            grants[1].capability,
            GrantedCapability::One(Capability::MoveElement)
        );
        assert_eq!(grants[1].course, Some(CourseId(3)));
    }

    #[test]
    fn unknown_capability_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "[[grants]]\nprincipal = \"bot\"\ncapability = \"course:delete\"\n",
        )
        .unwrap();

        let err = SyncConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
