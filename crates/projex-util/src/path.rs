//! Path utilities.
//!
//! Containment checks in this module resolve symbolic links before comparing
//! against the root, so a path that only looks like it lives under the root
//! is still rejected when a link points elsewhere.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Maximum number of dangling links followed while resolving one path.
const MAX_LINK_HOPS: usize = 40;

/// Get the projex configuration directory.
///
/// - `$XDG_CONFIG_HOME/projex` if set
/// - `~/.config/projex` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("projex"))
}

/// Get the projex data directory.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("projex"))
}

/// Default location for export runs.
pub fn runs_dir() -> Option<PathBuf> {
    data_dir().map(|p| p.join("runs"))
}

/// Get the projex logs directory.
///
/// Linux uses the XDG state directory, other platforms the local data directory.
pub fn logs_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        if let Some(state) = dirs::state_dir() {
            return Some(state.join("projex").join("logs"));
        }
    }
    data_dir().map(|p| p.join("logs"))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist and does not
/// look at symbolic links.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => {
                result.push(component);
            }
        }
    }

    result
}

/// Resolve a path the way the filesystem would, without requiring it to exist.
///
/// Components are applied left to right. Every existing symbolic link is
/// replaced by its canonical target as soon as it is reached, so a later `..`
/// climbs out of the link target rather than out of the link's parent.
/// Components past the deepest existing ancestor are applied lexically.
pub fn resolve(path: &Path) -> PathBuf {
    resolve_with_budget(path, MAX_LINK_HOPS)
}

fn resolve_with_budget(path: &Path, budget: usize) -> PathBuf {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                let is_link = fs::symlink_metadata(&resolved)
                    .map(|meta| meta.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link {
                    resolved = follow_link(&resolved, budget);
                }
            }
        }
    }

    resolved
}

fn follow_link(link: &Path, budget: usize) -> PathBuf {
    if let Ok(target) = link.canonicalize() {
        return target;
    }

    // Dangling or looping link: resolve its target text relative to the link.
    if budget == 0 {
        return link.to_path_buf();
    }
    match fs::read_link(link) {
        Ok(target) => {
            let base = link.parent().unwrap_or_else(|| Path::new("/"));
            resolve_with_budget(&base.join(target), budget - 1)
        }
        Err(_) => link.to_path_buf(),
    }
}

/// Check if an already-resolved path is the base itself or lies beneath it.
pub fn is_within(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A relative path resolved outside its root.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid path outside project root: {path}")]
pub struct PathEscapeError {
    /// The path as supplied by the caller.
    pub path: String,
}

/// Confines user-supplied relative paths to a root directory.
///
/// The root is canonicalized once on construction; every call to
/// [`PathGuard::resolve`] resolves the candidate independently, so each
/// operation in a batch gets its own check.
///
/// # Example
///
/// ```
/// use projex_util::PathGuard;
///
/// let dir = tempfile::tempdir().unwrap();
/// let guard = PathGuard::new(dir.path()).unwrap();
///
/// assert!(guard.resolve("src/main.rs").is_ok());
/// assert!(guard.resolve("../../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for an existing root directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    /// The canonical root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The final component of the root, if any.
    pub fn root_name(&self) -> Option<String> {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Resolve `relative` against the root.
    ///
    /// Succeeds with the absolute resolved path when it equals the root or is a
    /// descendant of it. Absolute inputs are accepted only if they resolve
    /// inside the root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf, PathEscapeError> {
        let relative = relative.as_ref();
        let destination = resolve(&self.root.join(relative));

        if is_within(&destination, &self.root) {
            Ok(destination)
        } else {
            Err(PathEscapeError {
                path: relative.display().to_string(),
            })
        }
    }

    /// Express an absolute path beneath the root as a POSIX relative path.
    pub fn relative_posix(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.root).ok().map(to_posix)
    }
}
