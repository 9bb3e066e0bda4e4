//! Directory walking and tree rendering.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory names skipped, with everything beneath them, unless overridden.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] =
    &[".git", ".idea", ".vscode", "node_modules", "target", "build"];

/// Immutable set of directory names pruned from every walk.
///
/// Cloning is cheap; clones share the same set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedDirs(Arc<BTreeSet<String>>);

impl ExcludedDirs {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(names.into_iter().map(Into::into).collect()))
    }

    /// A set that prunes nothing.
    pub fn none() -> Self {
        Self(Arc::new(BTreeSet::new()))
    }

    pub fn contains(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|name| self.0.contains(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ExcludedDirs {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_DIRS.iter().copied())
    }
}

/// Walks a directory tree, pruning excluded directories.
///
/// Symbolic links are never followed. A link to a directory is rendered as a
/// leaf (or pruned when its name is excluded). Links to files, and anything
/// else that is not a regular file, appear neither in the tree nor in
/// [`TreeWalker::walk`], so every file line has a matching record.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    excluded: ExcludedDirs,
}

struct TreeEntry {
    name: String,
    path: PathBuf,
    /// Real directory, rendered with its children.
    descend: bool,
}

impl TreeWalker {
    pub fn new(excluded: ExcludedDirs) -> Self {
        Self { excluded }
    }

    pub fn excluded(&self) -> &ExcludedDirs {
        &self.excluded
    }

    /// Lazily yield every regular file beneath `root`.
    ///
    /// Each call starts a fresh walk. Unreadable directories are logged and
    /// skipped; the rest of the tree is still walked.
    pub fn walk(&self, root: &Path) -> impl Iterator<Item = PathBuf> {
        let excluded = self.excluded.clone();

        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir() && excluded.contains(entry.file_name()))
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(
                        path = ?e.path(),
                        error = %e,
                        "Skipping unreadable entry"
                    );
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
    }

    /// Render `root` as an indented tree using box-drawing connectors.
    ///
    /// Siblings are sorted by name (ordinal), directories and files mixed. The
    /// root itself is not printed.
    pub fn render_tree(&self, root: &Path) -> String {
        let mut lines = Vec::new();
        self.render_dir(root, "", &mut lines);
        lines.join("\n")
    }

    fn render_dir(&self, dir: &Path, prefix: &str, lines: &mut Vec<String>) {
        let entries = match self.sorted_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                return;
            }
        };

        let count = entries.len();
        for (index, entry) in entries.into_iter().enumerate() {
            let is_last = index + 1 == count;
            let connector = if is_last { "└── " } else { "├── " };
            lines.push(format!("{prefix}{connector}{}", entry.name));

            if entry.descend {
                let extension = if is_last { "    " } else { "│   " };
                self.render_dir(&entry.path, &format!("{prefix}{extension}"), lines);
            }
        }
    }

    fn sorted_entries(&self, dir: &Path) -> io::Result<Vec<TreeEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(path = %dir.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            let is_link = file_type.is_symlink();
            let is_dir = if is_link {
                fs::metadata(&path).is_ok_and(|m| m.is_dir())
            } else {
                file_type.is_dir()
            };
            if !is_dir && !file_type.is_file() {
                continue;
            }

            let name = entry.file_name();
            if is_dir && self.excluded.contains(&name) {
                continue;
            }
            entries.push(TreeEntry {
                name: name.to_string_lossy().into_owned(),
                path,
                descend: is_dir && !is_link,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn relative_files(walker: &TreeWalker, root: &Path) -> Vec<String> {
        let mut files: Vec<String> = walker
            .walk(root)
            .map(|p| projex_util::path::to_posix(p.strip_prefix(root).unwrap()))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_walk_yields_files_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "src/lib.rs", "lib");
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let files = relative_files(&TreeWalker::default(), dir.path());
        assert_eq!(files, vec!["a.txt", "src/lib.rs"]);
    }

    #[test]
    fn test_walk_prunes_excluded_at_any_depth() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "keep.txt", "k");
        write(dir.path(), "node_modules/pkg/index.js", "x");
        write(dir.path(), "a/b/c/.git/HEAD", "ref");
        write(dir.path(), "a/b/c/target/debug/out", "bin");
        write(dir.path(), "a/b/c/main.rs", "fn main() {}");

        let files = relative_files(&TreeWalker::default(), dir.path());
        assert_eq!(files, vec!["a/b/c/main.rs", "keep.txt"]);
    }

    #[test]
    fn test_walk_keeps_files_named_like_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "build", "not a directory");

        let files = relative_files(&TreeWalker::default(), dir.path());
        assert_eq!(files, vec!["build"]);
    }

    #[test]
    fn test_walk_root_named_like_excluded_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("target");
        write(&root, "inside.txt", "x");

        let files = relative_files(&TreeWalker::default(), &root);
        assert_eq!(files, vec!["inside.txt"]);
    }

    #[test]
    fn test_walk_is_restartable_and_unique() {
        let dir = TempDir::new().unwrap();
        for i in 0..20 {
            write(dir.path(), &format!("d{}/f{}.txt", i % 3, i), "x");
        }
        let walker = TreeWalker::default();

        let first: Vec<PathBuf> = walker.walk(dir.path()).collect();
        let second: Vec<PathBuf> = walker.walk(dir.path()).collect();
        let unique: HashSet<&PathBuf> = first.iter().collect();

        assert_eq!(first.len(), 20);
        assert_eq!(unique.len(), 20);
        assert_eq!(second.len(), 20);
    }

    #[test]
    fn test_walk_custom_exclusions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "vendor/lib.c", "x");
        write(dir.path(), "node_modules/x.js", "x");

        let walker = TreeWalker::new(ExcludedDirs::new(["vendor"]));
        let files = relative_files(&walker, dir.path());
        assert_eq!(files, vec!["node_modules/x.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_symlinks() {
        let outside = TempDir::new().unwrap();
        write(outside.path(), "secret.txt", "s");
        let dir = TempDir::new().unwrap();
        write(dir.path(), "real.txt", "r");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked_dir")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("linked.txt"),
        )
        .unwrap();

        let files = relative_files(&TreeWalker::default(), dir.path());
        assert_eq!(files, vec!["real.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_render_tree_agrees_with_walk_on_symlinks() {
        let outside = TempDir::new().unwrap();
        write(outside.path(), "node_modules/pkg.js", "x");
        write(outside.path(), "docs/readme.md", "r");
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "real.txt", "r");
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("node_modules"),
            dir.path().join("node_modules"),
        )
        .unwrap();
        std::os::unix::fs::symlink(outside.path().join("docs"), dir.path().join("docs")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let walker = TreeWalker::default();
        let tree = walker.render_tree(dir.path());
        assert_eq!(tree, "├── a.txt\n├── docs\n└── real.txt");

        let files = relative_files(&walker, dir.path());
        assert_eq!(files, vec!["a.txt", "real.txt"]);
        for file in &files {
            assert!(tree.lines().any(|line| line.ends_with(file.as_str())));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "ok.txt", "ok");
        write(dir.path(), "locked/x.txt", "x");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permission bits are not enforced for this user (root).
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let walker = TreeWalker::default();
        let files = relative_files(&walker, dir.path());
        let tree = walker.render_tree(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(files, vec!["ok.txt"]);
        assert_eq!(tree, "├── locked\n└── ok.txt");
    }

    #[test]
    fn test_render_tree_nested() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", "b");
        write(dir.path(), "a/x.rs", "x");
        write(dir.path(), "a/y/z.rs", "z");
        write(dir.path(), "c/w.md", "w");

        let tree = TreeWalker::default().render_tree(dir.path());
        let expected = [
            "├── a",
            "│   ├── x.rs",
            "│   └── y",
            "│       └── z.rs",
            "├── b.txt",
            "└── c",
            "    └── w.md",
        ]
        .join("\n");
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_render_tree_mixes_files_and_dirs_lexically() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Zeta/file", "z");
        write(dir.path(), "alpha.txt", "a");
        write(dir.path(), "beta/file", "b");

        let tree = TreeWalker::default().render_tree(dir.path());
        let top_level: Vec<&str> = tree
            .lines()
            .filter(|line| line.starts_with("├── ") || line.starts_with("└── "))
            .collect();
        assert_eq!(top_level, vec!["├── Zeta", "├── alpha.txt", "└── beta"]);
    }

    #[test]
    fn test_render_tree_omits_excluded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/x.txt", "x");
        write(dir.path(), "src/.git/config", "c");
        write(dir.path(), "src/main.rs", "m");

        let tree = TreeWalker::default().render_tree(dir.path());
        assert_eq!(tree, "└── src\n    └── main.rs");
    }

    #[test]
    fn test_render_tree_empty_root() {
        let dir = TempDir::new().unwrap();
        assert_eq!(TreeWalker::default().render_tree(dir.path()), "");
    }
}
