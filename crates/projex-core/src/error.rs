//! Error types for the core crate.

use projex_snapshot::SnapshotError;
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot or artifact store error.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Request rejected before any work was done.
    #[error("{0}")]
    Validation(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_fault(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Snapshot(e) => e.is_client_fault(),
            _ => false,
        }
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Environment variable not found during substitution.
    #[error("environment variable not found: {name}")]
    EnvVarNotFound { name: String },

    /// File reference not found during substitution.
    #[error("file reference not found: {path}")]
    FileRefNotFound { path: String },

    /// Invalid path (e.g., could not determine the storage directory).
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
