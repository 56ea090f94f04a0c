use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while listing or reading test inputs.
///
/// Directive anomalies are never errors; only filesystem failures are.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Test directory not found.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, InventoryError>;
