//! Directory snapshot engine for projex.
//!
//! This crate captures a directory tree into a single exportable document:
//! - [`TreeWalker`] enumerates files and renders the folder structure,
//!   pruning excluded directory names at any depth
//! - [`classify`] separates binary files from text
//! - [`SnapshotCollector`] fans classification out over a bounded pool and
//!   returns records in a deterministic order
//! - [`render_export`] writes a snapshot to any [`DocumentSink`]
//! - [`ArtifactStore`] keeps one directory per export run
//!
//! # Example
//!
//! ```no_run
//! use projex_snapshot::{render_export, MarkdownDocument, SnapshotCollector};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshot = SnapshotCollector::default()
//!     .snapshot(Path::new("/work/myproj"))
//!     .await?;
//!
//! let mut doc = MarkdownDocument::new();
//! render_export(&mut doc, &snapshot, chrono::Utc::now());
//! println!("{}", doc.as_str());
//! # Ok(())
//! # }
//! ```

mod classify;
mod collector;
mod document;
mod error;
mod snapshot;
mod store;
mod walker;

pub use classify::{classify, is_binary, BINARY_PROBE_LEN};
pub use collector::{default_workers, verify_root, SnapshotCollector, MIN_WORKERS};
pub use document::{render_export, DocumentSink, MarkdownDocument};
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{FileContent, FileRecord, Snapshot, BINARY_SENTINEL};
pub use store::{ArtifactStore, EXPORT_FILE_NAME, UPLOAD_DIR_NAME};
pub use walker::{ExcludedDirs, TreeWalker, DEFAULT_EXCLUDED_DIRS};
