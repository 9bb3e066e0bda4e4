//! Operation path normalization.

use crate::{PatchError, PatchResult};

/// Normalize a client-supplied operation path.
///
/// Leading `./` segments, repeated separators and inner `.` segments are
/// dropped. `..` segments are kept for the containment check to judge.
/// A relative path whose first segment is the root directory's own name,
/// followed by more segments, is rejected before any resolution.
pub fn normalize_operation_path(path: &str, root_name: Option<&str>) -> PatchResult<String> {
    let absolute = path.starts_with('/');
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if let Some(name) = root_name {
        if !absolute && segments.len() > 1 && segments[0] == name {
            return Err(PatchError::root_prefix(name));
        }
    }

    let joined = segments.join("/");
    Ok(if absolute { format!("/{joined}") } else { joined })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_dot_slash() {
        assert_eq!(normalize_operation_path("./a.txt", None).unwrap(), "a.txt");
        assert_eq!(normalize_operation_path("././src/a.rs", None).unwrap(), "src/a.rs");
        assert_eq!(normalize_operation_path("src//./a.rs", None).unwrap(), "src/a.rs");
    }

    #[test]
    fn test_keeps_parent_segments_and_dotfiles() {
        assert_eq!(
            normalize_operation_path("../../etc/passwd", None).unwrap(),
            "../../etc/passwd"
        );
        assert_eq!(normalize_operation_path(".env", None).unwrap(), ".env");
        assert_eq!(normalize_operation_path("./.github/ci.yml", None).unwrap(), ".github/ci.yml");
    }

    #[test]
    fn test_rejects_root_name_prefix() {
        let err = normalize_operation_path("myproj/src/a.txt", Some("myproj")).unwrap_err();
        assert!(matches!(err, PatchError::PathEscape(_)));
        assert!(err.to_string().contains("Remove leading 'myproj/'"));

        assert!(normalize_operation_path("./myproj/a.txt", Some("myproj")).is_err());
    }

    #[test]
    fn test_root_name_alone_or_as_prefix_of_segment_is_allowed() {
        assert_eq!(normalize_operation_path("myproj", Some("myproj")).unwrap(), "myproj");
        assert_eq!(
            normalize_operation_path("myproj-docs/a.md", Some("myproj")).unwrap(),
            "myproj-docs/a.md"
        );
        assert_eq!(
            normalize_operation_path("src/myproj/a.rs", Some("myproj")).unwrap(),
            "src/myproj/a.rs"
        );
    }

    #[test]
    fn test_absolute_paths_stay_absolute() {
        assert_eq!(normalize_operation_path("/etc/passwd", None).unwrap(), "/etc/passwd");
    }

    #[test]
    fn test_root_itself() {
        assert_eq!(normalize_operation_path("", None).unwrap(), "");
        assert_eq!(normalize_operation_path("./", None).unwrap(), "");
    }
}
