//! Snapshot error types.

use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
///
/// Failures on individual files never show up here; they are captured in the
/// record's content instead.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Root does not exist or is not a directory.
    #[error("Project root not found: {0}")]
    RootNotFound(String),

    /// Root exists but its entries cannot be listed.
    #[error("Project root cannot be read: {path}: {source}")]
    RootUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Requested artifact or upload path is not inside the store.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Requested artifact does not exist.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SnapshotError {
    /// Create a root not found error.
    pub fn root_not_found(path: impl Into<String>) -> Self {
        Self::RootNotFound(path.into())
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Whether the error was caused by caller input rather than an internal fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::RootNotFound(_) | Self::InvalidPath(_))
    }
}
