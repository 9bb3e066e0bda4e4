//! Concurrent snapshot collection.

use crate::classify::classify;
use crate::walker::TreeWalker;
use crate::{FileRecord, Snapshot, SnapshotError, SnapshotResult};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use projex_util::path::to_posix;
use projex_util::TimingGuard;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Minimum size of the classification pool.
pub const MIN_WORKERS: usize = 4;

/// Default pool size: the machine's parallelism, but never below [`MIN_WORKERS`].
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .max(MIN_WORKERS)
}

/// Canonicalize `root` and check that it is a listable directory.
pub async fn verify_root(root: &Path) -> SnapshotResult<PathBuf> {
    let canonical = tokio::fs::canonicalize(root)
        .await
        .map_err(|_| SnapshotError::root_not_found(root.display().to_string()))?;

    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|_| SnapshotError::root_not_found(root.display().to_string()))?;
    if !metadata.is_dir() {
        return Err(SnapshotError::root_not_found(root.display().to_string()));
    }

    let _listing = tokio::fs::read_dir(&canonical)
        .await
        .map_err(|source| SnapshotError::RootUnreadable {
            path: canonical.display().to_string(),
            source,
        })?;

    Ok(canonical)
}

/// Walks a root and captures every file on a bounded pool of blocking tasks.
///
/// Records come back sorted by relative path no matter which task finishes
/// first. Tasks share nothing but the read-only walker configuration.
#[derive(Debug, Clone)]
pub struct SnapshotCollector {
    walker: TreeWalker,
    max_workers: usize,
}

impl Default for SnapshotCollector {
    fn default() -> Self {
        Self::new(TreeWalker::default(), default_workers())
    }
}

impl SnapshotCollector {
    /// Create a collector. A worker count of zero is treated as one.
    pub fn new(walker: TreeWalker, max_workers: usize) -> Self {
        Self {
            walker,
            max_workers: max_workers.max(1),
        }
    }

    pub fn walker(&self) -> &TreeWalker {
        &self.walker
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Capture every file beneath `root`, ordered by relative path.
    ///
    /// Fails only when the root itself is missing or unreadable.
    pub async fn collect(&self, root: &Path) -> SnapshotResult<Vec<FileRecord>> {
        let root = verify_root(root).await?;
        self.collect_verified(root).await
    }

    /// Take a full snapshot: tree rendering plus ordered records.
    pub async fn snapshot(&self, root: &Path) -> SnapshotResult<Snapshot> {
        let root = verify_root(root).await?;

        let walker = self.walker.clone();
        let tree_root = root.clone();
        let tree = tokio::task::spawn_blocking(move || walker.render_tree(&tree_root)).await?;

        let records = self.collect_verified(root.clone()).await?;

        Ok(Snapshot {
            root,
            tree,
            records,
        })
    }

    async fn collect_verified(&self, root: PathBuf) -> SnapshotResult<Vec<FileRecord>> {
        let mut timing = TimingGuard::snapshot(root.display().to_string());

        let walker = self.walker.clone();
        let walk_root = root.clone();
        let paths =
            tokio::task::spawn_blocking(move || walker.walk(&walk_root).collect::<Vec<_>>())
                .await?;
        debug!(root = %root.display(), files = paths.len(), "Enumerated files");

        let mut records: Vec<FileRecord> = stream::iter(paths)
            .map(|path| {
                let root = root.clone();
                async move {
                    let task_root = root.clone();
                    let task_path = path.clone();
                    match tokio::task::spawn_blocking(move || capture(&task_root, &task_path))
                        .await
                    {
                        Ok(record) => record,
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Capture task failed");
                            FileRecord::unreadable(relative_path(&root, &path), e.to_string())
                        }
                    }
                }
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        timing.set_items(records.len());

        info!(
            root = %root.display(),
            files = records.len(),
            workers = self.max_workers,
            "Collected snapshot"
        );
        Ok(records)
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(to_posix)
        .unwrap_or_else(|_| path.display().to_string())
}

/// Capture metadata and content for one file.
fn capture(root: &Path, path: &Path) -> FileRecord {
    let relative_path = relative_path(root, path);

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unable to read metadata");
            return FileRecord::unreadable(relative_path, e.to_string());
        }
    };

    FileRecord {
        relative_path,
        size_bytes: metadata.len(),
        modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        content: classify(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::ExcludedDirs;
    use crate::{FileContent, BINARY_SENTINEL};
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_default_workers_floor() {
        assert!(default_workers() >= MIN_WORKERS);
        assert_eq!(SnapshotCollector::new(TreeWalker::default(), 0).max_workers(), 1);
    }

    #[tokio::test]
    async fn test_collect_scenario() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", b"hello");
        write(dir.path(), "sub/b.bin", &[0x00, 0x01, 0x02]);
        write(dir.path(), "node_modules/x.txt", b"ignored");

        let records = SnapshotCollector::default().collect(dir.path()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].relative_path, "a.txt");
        assert_eq!(records[0].content, FileContent::Text("hello".into()));
        assert_eq!(records[0].size_bytes, 5);
        assert!(records[0].modified_at.is_some());
        assert_eq!(records[1].relative_path, "sub/b.bin");
        assert_eq!(records[1].content.to_string(), BINARY_SENTINEL);
        assert_eq!(records[1].size_bytes, 3);
    }

    #[tokio::test]
    async fn test_collect_is_sorted_ordinally() {
        let dir = TempDir::new().unwrap();
        let names = [
            "zeta.txt", "Alpha.txt", "beta/c.txt", "beta.txt", "a/b/c.txt", "a-b.txt", "_x",
            "10.txt", "9.txt",
        ];
        for name in names {
            write(dir.path(), name, name.as_bytes());
        }

        let collector = SnapshotCollector::new(TreeWalker::default(), 8);
        let records = collector.collect(dir.path()).await.unwrap();
        let paths: Vec<&str> = records.iter().map(|r| r.relative_path.as_str()).collect();

        let mut expected: Vec<&str> = names.to_vec();
        expected.sort();
        assert_eq!(paths, expected);
        assert!(paths.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_collect_many_files_with_single_worker() {
        let dir = TempDir::new().unwrap();
        for i in 0..50 {
            write(dir.path(), &format!("dir{}/file{:02}.txt", i % 5, i), b"x");
        }

        let collector = SnapshotCollector::new(TreeWalker::default(), 1);
        let records = collector.collect(dir.path()).await.unwrap();

        assert_eq!(records.len(), 50);
        assert!(records
            .windows(2)
            .all(|w| w[0].relative_path < w[1].relative_path));
    }

    #[tokio::test]
    async fn test_collect_excludes_nested_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.rs", b"fn main() {}");
        write(dir.path(), "src/deep/build/gen.rs", b"generated");
        write(dir.path(), ".idea/workspace.xml", b"<xml/>");

        let records = SnapshotCollector::default().collect(dir.path()).await.unwrap();
        let paths: Vec<&str> = records.iter().map(|r| r.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["src/main.rs"]);
    }

    #[tokio::test]
    async fn test_collect_with_overridden_exclusions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "build/out.txt", b"kept now");
        write(dir.path(), "dist/app.js", b"pruned");

        let walker = TreeWalker::new(ExcludedDirs::new(["dist"]));
        let records = SnapshotCollector::new(walker, 4)
            .collect(dir.path())
            .await
            .unwrap();
        let paths: Vec<&str> = records.iter().map(|r| r.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["build/out.txt"]);
    }

    #[tokio::test]
    async fn test_collect_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = SnapshotCollector::default()
            .collect(&dir.path().join("missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::RootNotFound(_)));
        assert!(err.is_client_fault());
    }

    #[tokio::test]
    async fn test_collect_root_is_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "file.txt", b"x");

        let err = SnapshotCollector::default()
            .collect(&dir.path().join("file.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::RootNotFound(_)));
    }

    #[tokio::test]
    async fn test_snapshot_includes_tree() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", b"hello");
        write(dir.path(), "sub/b.bin", &[0x00]);

        let snapshot = SnapshotCollector::default()
            .snapshot(dir.path())
            .await
            .unwrap();

        assert_eq!(snapshot.tree, "├── a.txt\n└── sub\n    └── b.bin");
        assert_eq!(snapshot.file_count(), 2);
        assert_eq!(snapshot.root, dir.path().canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_snapshot_survives_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "ok.txt", b"ok");
        write(dir.path(), "sub/also.txt", b"also");
        write(dir.path(), "locked/x.txt", b"x");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permission bits are not enforced for this user (root).
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = SnapshotCollector::default().snapshot(dir.path()).await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let snapshot = result.unwrap();
        let paths: Vec<&str> = snapshot
            .records
            .iter()
            .map(|r| r.relative_path.as_str())
            .collect();
        assert_eq!(paths, vec!["ok.txt", "sub/also.txt"]);
        assert_eq!(snapshot.tree, "├── locked\n├── ok.txt\n└── sub\n    └── also.txt");
    }

    #[test]
    fn test_capture_vanished_file() {
        let dir = TempDir::new().unwrap();
        let record = capture(dir.path(), &dir.path().join("gone.txt"));

        assert_eq!(record.relative_path, "gone.txt");
        assert_eq!(record.size_bytes, 0);
        assert!(matches!(record.content, FileContent::Unreadable(_)));
    }
}
