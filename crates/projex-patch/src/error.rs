//! Patch error types.

use crate::MutationOutcome;
use projex_util::PathEscapeError;
use thiserror::Error;

/// Result type for a single patch operation.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can occur while applying an operation.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The operation path resolves outside the project root.
    #[error("{0}")]
    PathEscape(String),

    /// The operation is malformed: unknown action, missing content, or a root target.
    #[error("{0}")]
    InvalidOperation(String),

    /// Project root does not exist or is not a directory.
    #[error("Project root not found: {0}")]
    RootNotFound(String),

    /// Filesystem error while mutating a path.
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    /// Create an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Create an error for a path that carries the root directory's own name.
    pub fn root_prefix(root_name: &str) -> Self {
        Self::PathEscape(format!(
            "Path must be relative to project root. Remove leading '{root_name}/'."
        ))
    }

    /// Create an IO error for a path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

impl From<PathEscapeError> for PatchError {
    fn from(e: PathEscapeError) -> Self {
        Self::PathEscape(e.to_string())
    }
}

/// A batch stopped part way through.
///
/// Operations before the failing one stay applied; `applied` lists their
/// outcomes in order.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PatchFailure {
    pub applied: Vec<MutationOutcome>,
    pub error: PatchError,
}

impl PatchFailure {
    /// Failure before any operation ran.
    pub fn before_start(error: PatchError) -> Self {
        Self {
            applied: Vec::new(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            PatchError::root_prefix("myproj").to_string(),
            "Path must be relative to project root. Remove leading 'myproj/'."
        );

        let escape: PatchError = PathEscapeError {
            path: "../x".into(),
        }
        .into();
        assert_eq!(
            escape.to_string(),
            "Invalid path outside project root: ../x"
        );
    }

    #[test]
    fn test_client_fault() {
        assert!(PatchError::invalid_operation("Unknown action: move").is_client_fault());
        assert!(PatchError::RootNotFound("/nope".into()).is_client_fault());
        assert!(!PatchError::io(
            "a.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
        )
        .is_client_fault());
    }
}
