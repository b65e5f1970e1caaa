//! Path utilities for safe file system operations.
//!
//! Provides path normalization and security checks to prevent directory traversal.

use crate::error::{ShelfError, ShelfResult};
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                // Keep a leading .. so escaping paths stay visible
                match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    },
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {},
                    _ => components.push(component),
                }
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Check if a relative path stays below its base (no directory traversal)
pub fn is_safe_path(path: &Path) -> bool {
    if path.is_absolute() {
        return false;
    }

    let mut depth = 0i32;

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            },
            Component::Normal(_) => {
                depth += 1;
            },
            _ => {
                return false;
            },
        }
    }

    true
}

/// Check that `value` is exactly one ordinary path component
pub fn is_safe_component(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\', '\0'])
}

/// Safely join paths, preventing directory traversal
pub fn safe_join(base: &Path, path: &Path) -> ShelfResult<PathBuf> {
    if !is_safe_path(path) {
        return Err(ShelfError::PathTraversal {
            path: path.display().to_string(),
        });
    }

    Ok(base.join(normalize_path(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Path::new("./repos/../el9/./Packages/foo.rpm");
        assert_eq!(normalize_path(path), Path::new("el9/Packages/foo.rpm"));

        assert_eq!(normalize_path(Path::new("/a/b/../c")), Path::new("/a/c"));
        assert_eq!(normalize_path(Path::new("../x")), Path::new("../x"));
    }

    #[test]
    fn test_is_safe_path() {
        assert!(is_safe_path(Path::new("el9/x86_64/os")));
        assert!(is_safe_path(Path::new("./el9/a/../b")));
        assert!(!is_safe_path(Path::new("../../../etc/passwd")));
        assert!(!is_safe_path(Path::new("/absolute/path")));
    }

    #[test]
    fn test_is_safe_component() {
        assert!(is_safe_component("foo-1.0-1.x86_64.rpm"));
        assert!(is_safe_component("1.fc39"));
        assert!(!is_safe_component(""));
        assert!(!is_safe_component("."));
        assert!(!is_safe_component(".."));
        assert!(!is_safe_component("a/b"));
        assert!(!is_safe_component("a\\b"));
    }

    #[test]
    fn test_safe_join() {
        let base = Path::new("/srv/shelf/repos");

        let joined = safe_join(base, Path::new("el9/os/foo.rpm")).unwrap();
        assert_eq!(joined, Path::new("/srv/shelf/repos/el9/os/foo.rpm"));

        let result = safe_join(base, Path::new("../packages"));
        assert!(matches!(result, Err(ShelfError::PathTraversal { .. })));
    }
}
