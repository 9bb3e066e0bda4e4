//! Sequential patch application.

use crate::guard::normalize_operation_path;
use crate::{Action, MutationOperation, MutationOutcome, PatchError, PatchFailure, PatchResult};
use projex_util::{PathGuard, TimingGuard};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

/// Applies mutation operations to one project root.
///
/// Operations run strictly in order. Every path is checked against the root
/// before anything on disk changes. A failing operation stops the batch;
/// the ones before it stay applied.
#[derive(Debug, Clone)]
pub struct PatchExecutor {
    guard: PathGuard,
    root_name: Option<String>,
}

impl PatchExecutor {
    /// Create an executor for an existing root directory.
    pub fn new(root: impl AsRef<Path>) -> PatchResult<Self> {
        let root = root.as_ref();
        let not_found = || PatchError::RootNotFound(root.display().to_string());

        let guard = PathGuard::new(root).map_err(|_| not_found())?;
        if !guard.root().is_dir() {
            return Err(not_found());
        }

        let root_name = guard.root_name();
        Ok(Self { guard, root_name })
    }

    /// Canonical project root.
    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Apply `operations` in order.
    ///
    /// Returns one outcome per operation. On failure, the outcomes of the
    /// operations that completed are returned alongside the error.
    pub async fn apply(
        &self,
        operations: &[MutationOperation],
    ) -> Result<Vec<MutationOutcome>, PatchFailure> {
        let mut timing = TimingGuard::patch(self.root().display().to_string());
        let mut applied = Vec::with_capacity(operations.len());

        for (index, operation) in operations.iter().enumerate() {
            match self.apply_one(operation).await {
                Ok(outcome) => {
                    debug!(index, outcome = %outcome, "Applied operation");
                    applied.push(outcome);
                    timing.set_items(applied.len());
                }
                Err(error) => {
                    warn!(
                        root = %self.root().display(),
                        index,
                        action = %operation.action,
                        path = %operation.path,
                        applied = applied.len(),
                        error = %error,
                        "Patch batch aborted"
                    );
                    return Err(PatchFailure { applied, error });
                }
            }
        }

        info!(
            root = %self.root().display(),
            operations = applied.len(),
            "Applied patch"
        );
        Ok(applied)
    }

    async fn apply_one(&self, operation: &MutationOperation) -> PatchResult<MutationOutcome> {
        let action = operation.action()?;
        let path = normalize_operation_path(&operation.path, self.root_name.as_deref())?;

        // Validate content before touching the filesystem.
        let content = match (action.writes(), operation.content.as_deref()) {
            (true, Some(content)) => Some(content),
            (true, None) => {
                return Err(PatchError::invalid_operation(format!(
                    "Missing content for {action} {path}"
                )))
            }
            (false, _) => None,
        };

        let destination = self.guard.resolve(&path)?;
        if destination == self.root() {
            return Err(PatchError::invalid_operation(format!(
                "Operation cannot target the project root: {action} '{}'",
                operation.path
            )));
        }

        match content {
            Some(content) => {
                if let Some(parent) = destination.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| PatchError::io(parent.display().to_string(), e))?;
                }
                fs::write(&destination, content)
                    .await
                    .map_err(|e| PatchError::io(&path, e))?;
                Ok(MutationOutcome::written(action, &path))
            }
            None => self.delete(&destination, &path).await,
        }
    }

    async fn delete(&self, destination: &Path, path: &str) -> PatchResult<MutationOutcome> {
        let metadata = match fs::metadata(destination).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(MutationOutcome::skipped_missing(path));
            }
            Err(e) => return Err(PatchError::io(path, e)),
        };

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(destination).await
        } else {
            fs::remove_file(destination).await
        };
        removed.map_err(|e| PatchError::io(path, e))?;

        Ok(MutationOutcome::deleted(path))
    }
}

/// Apply `operations` to `root` in order.
pub async fn apply(
    root: impl AsRef<Path>,
    operations: &[MutationOperation],
) -> Result<Vec<MutationOutcome>, PatchFailure> {
    let executor = PatchExecutor::new(root).map_err(PatchFailure::before_start)?;
    executor.apply(operations).await
}
