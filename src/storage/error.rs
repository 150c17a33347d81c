use std::path::PathBuf;

/// Errors raised by the local state file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("failed to encode value for '{key}': {message}")]
    Encode { key: String, message: String },
}
