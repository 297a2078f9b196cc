//! Path depth relative to the watch root.

use std::path::{Path, PathBuf};

/// Number of path segments `path` lies below `root`.
///
/// Both paths are compared in absolute form. Returns `None` when `path` is
/// not under `root`; `Some(0)` for the root itself.
#[must_use]
pub fn depth_of(path: &Path, root: &Path) -> Option<usize> {
    let path = absolutize(path);
    let root = absolutize(root);

    path.strip_prefix(&root)
        .ok()
        .map(|rest| rest.components().count())
}

/// Check whether a newly created directory may be registered.
///
/// Paths outside the root have no depth and are never held back by the
/// bound, matching how an unrooted path compares below any limit.
#[must_use]
pub fn within_depth(path: &Path, root: &Path, max_depth: Option<usize>) -> bool {
    match (max_depth, depth_of(path, root)) {
        (None, _) | (Some(_), None) => true,
        (Some(max), Some(depth)) => depth < max,
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_depth_zero() {
        assert_eq!(depth_of(Path::new("/data"), Path::new("/data")), Some(0));
    }

    #[test]
    fn test_nested_depth() {
        let root = Path::new("/data/project");
        assert_eq!(depth_of(Path::new("/data/project/src"), root), Some(1));
        assert_eq!(
            depth_of(Path::new("/data/project/src/watcher/mod.rs"), root),
            Some(3)
        );
    }

    #[test]
    fn test_outside_root() {
        let root = Path::new("/data/project");
        assert_eq!(depth_of(Path::new("/data/other"), root), None);
        assert_eq!(depth_of(Path::new("/data"), root), None);
        // Component-wise prefix, not string prefix.
        assert_eq!(depth_of(Path::new("/data/project2/src"), root), None);
    }

    #[test]
    fn test_relative_paths_compare_absolute() {
        assert_eq!(depth_of(Path::new("a/b/c"), Path::new("a")), Some(2));
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(depth_of(&cwd.join("a/b"), Path::new("a")), Some(1));
    }

    #[test]
    fn test_within_depth() {
        let root = Path::new("/r");
        assert!(within_depth(Path::new("/r/a/b/c/d"), root, None));
        assert!(within_depth(Path::new("/r/a"), root, Some(2)));
        assert!(!within_depth(Path::new("/r/a/b"), root, Some(2)));
        assert!(!within_depth(Path::new("/r/a"), root, Some(0)));
        assert!(within_depth(Path::new("/elsewhere"), root, Some(0)));
    }
}
