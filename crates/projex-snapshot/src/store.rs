//! Export artifact storage.

use crate::{SnapshotError, SnapshotResult};
use projex_util::{PathGuard, RunId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the export artifact inside a run directory.
pub const EXPORT_FILE_NAME: &str = "project-export.md";

/// Directory inside a run that receives uploaded files.
pub const UPLOAD_DIR_NAME: &str = "upload";

/// Upper bound on same-second collisions before giving up.
const MAX_RUN_SUFFIX: u32 = 1000;

/// Storage for export runs.
///
/// Every run gets its own directory:
/// ```text
/// base_dir/
///   <run_id>/
///     project-export.md   # Rendered export
///     upload/             # Uploaded files, when the run came from an upload
/// ```
/// Retention is left to the operator; runs are never deleted here.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    guard: PathGuard,
}

impl ArtifactStore {
    /// Open a store, creating the base directory if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> SnapshotResult<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir).await?;
        let guard = PathGuard::new(base_dir)?;
        debug!(base_dir = %guard.root().display(), "Opened artifact store");
        Ok(Self { guard })
    }

    /// Canonical base directory.
    pub fn base_dir(&self) -> &Path {
        self.guard.root()
    }

    pub fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.base_dir().join(run_id.as_str())
    }

    /// Allocate a fresh run directory keyed by the current UTC second.
    pub async fn create_run(&self) -> SnapshotResult<RunId> {
        let base = RunId::now();
        let mut candidate = base.clone();

        for n in 1..=MAX_RUN_SUFFIX {
            match fs::create_dir(self.run_dir(&candidate)).await {
                Ok(()) => {
                    info!(run_id = %candidate, "Created export run");
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = base.with_suffix(n);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SnapshotError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("too many export runs started at {base}"),
        )))
    }

    /// Write the rendered export for a run and return its path.
    pub async fn write_export(&self, run_id: &RunId, contents: &str) -> SnapshotResult<PathBuf> {
        let path = self.run_dir(run_id).join(EXPORT_FILE_NAME);
        fs::write(&path, contents).await?;
        info!(
            run_id = %run_id,
            path = %path.display(),
            bytes = contents.len(),
            "Wrote export artifact"
        );
        Ok(path)
    }

    /// Create and return the upload directory of a run.
    pub async fn upload_root(&self, run_id: &RunId) -> SnapshotResult<PathBuf> {
        let path = self.run_dir(run_id).join(UPLOAD_DIR_NAME);
        fs::create_dir_all(&path).await?;
        Ok(path)
    }

    /// Store one uploaded file under `upload_root`.
    ///
    /// `name` is the client-supplied relative path. It must stay inside the
    /// upload root and must name a file, not the root itself.
    pub async fn store_upload(
        &self,
        upload_root: &Path,
        name: &str,
        bytes: &[u8],
    ) -> SnapshotResult<PathBuf> {
        let guard = PathGuard::new(upload_root)?;
        let destination = guard
            .resolve(name)
            .map_err(|e| SnapshotError::invalid_path(e.path))?;
        if destination == guard.root() {
            return Err(SnapshotError::invalid_path(name));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&destination, bytes).await?;
        debug!(name = %name, bytes = bytes.len(), "Stored upload");
        Ok(destination)
    }

    /// Resolve a requested artifact path, which must lie inside the store.
    ///
    /// Accepts absolute paths as returned by [`ArtifactStore::write_export`]
    /// as well as paths relative to the base directory.
    pub async fn locate(&self, requested: &str) -> SnapshotResult<PathBuf> {
        let path = self
            .guard
            .resolve(requested)
            .map_err(|e| SnapshotError::invalid_path(e.path))?;

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            _ => Err(SnapshotError::ArtifactNotFound(requested.to_string())),
        }
    }
}
