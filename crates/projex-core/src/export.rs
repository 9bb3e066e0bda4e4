//! Export runs: snapshot a directory and store the rendered document.

use crate::{Config, CoreError, CoreResult};
use chrono::Utc;
use projex_snapshot::{
    render_export, ArtifactStore, MarkdownDocument, Snapshot, SnapshotCollector,
};
use projex_util::RunId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of one export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub run_id: RunId,
    /// Absolute path of the rendered document.
    pub artifact_path: PathBuf,
    pub file_count: usize,
}

/// A file received from a client upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied path, relative to the uploaded folder.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Runs exports against an artifact store.
#[derive(Debug, Clone)]
pub struct ExportService {
    store: ArtifactStore,
    collector: SnapshotCollector,
}

impl ExportService {
    pub fn new(store: ArtifactStore, collector: SnapshotCollector) -> Self {
        Self { store, collector }
    }

    /// Build a service from configuration, opening the storage directory.
    pub async fn from_config(config: &Config) -> CoreResult<Self> {
        let store = ArtifactStore::new(config.storage_path()?).await?;
        Ok(Self::new(store, config.collector()))
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn collector(&self) -> &SnapshotCollector {
        &self.collector
    }

    /// Export an existing directory.
    ///
    /// The root is checked before a run directory is allocated.
    pub async fn export_directory(&self, root: &Path) -> CoreResult<ExportSummary> {
        let snapshot = self.collector.snapshot(root).await?;
        let run_id = self.store.create_run().await?;
        self.finish_run(run_id, &snapshot).await
    }

    /// Store uploaded files under a fresh run and export them.
    pub async fn export_upload(&self, files: Vec<UploadedFile>) -> CoreResult<ExportSummary> {
        if files.is_empty() {
            return Err(CoreError::validation("No files uploaded"));
        }

        let run_id = self.store.create_run().await?;
        let upload_root = self.store.upload_root(&run_id).await?;
        for file in &files {
            self.store
                .store_upload(&upload_root, &file.name, &file.bytes)
                .await?;
        }
        info!(run_id = %run_id, files = files.len(), "Stored upload");

        let snapshot = self.collector.snapshot(&upload_root).await?;
        self.finish_run(run_id, &snapshot).await
    }

    async fn finish_run(&self, run_id: RunId, snapshot: &Snapshot) -> CoreResult<ExportSummary> {
        let mut document = MarkdownDocument::new();
        render_export(&mut document, snapshot, Utc::now());

        let artifact_path = self
            .store
            .write_export(&run_id, document.as_str())
            .await?;

        Ok(ExportSummary {
            run_id,
            artifact_path,
            file_count: snapshot.file_count(),
        })
    }
}
