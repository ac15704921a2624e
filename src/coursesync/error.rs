use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {principal} lacks '{capability}' on {scope}")]
    Authorization {
        principal: String,
        capability: String,
        scope: String,
    },

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Stable failure category reported to callers over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Conflict,
    Store,
}

impl SyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        SyncError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SyncError::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) | SyncError::Config(_) => ErrorKind::Validation,
            SyncError::NotFound(_) => ErrorKind::NotFound,
            SyncError::Authorization { .. } => ErrorKind::Authorization,
            SyncError::Conflict(_) => ErrorKind::Conflict,
            SyncError::Io(_) | SyncError::Serialization(_) | SyncError::Store(_) => {
                ErrorKind::Store
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
