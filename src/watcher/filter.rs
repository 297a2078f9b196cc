//! Suffix-based path filtering.

use std::path::Path;

/// Decides whether a path qualifies for notification.
///
/// A path is allowed when no suffixes are configured, or when its string
/// form ends with at least one of them. Matching is on the whole path, not
/// just the extension, so `"_test.rs"` and `".tar.gz"` work as expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    suffixes: Vec<String>,
}

impl PathFilter {
    /// Create a filter from a set of suffixes.
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a path passes the filter.
    #[must_use]
    pub fn allows(&self, path: &Path) -> bool {
        if self.suffixes.is_empty() {
            return true;
        }

        let path_str = path.to_string_lossy();
        self.suffixes.iter().any(|s| path_str.ends_with(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_allows_everything() {
        let filter = PathFilter::new(Vec::<String>::new());
        assert!(filter.allows(Path::new("/project/src/main.rs")));
        assert!(filter.allows(Path::new("/project/image.png")));
        assert!(filter.allows(Path::new("/project/src")));
    }

    #[test]
    fn test_single_suffix() {
        let filter = PathFilter::new([".png"]);
        assert!(filter.allows(Path::new("/res/testDir11/testLevel23.png")));
        assert!(!filter.allows(Path::new("/res/testDir11/testLevel23.txt")));
    }

    #[test]
    fn test_any_suffix_matches() {
        let filter = PathFilter::new([".rs", ".toml"]);
        assert!(filter.allows(Path::new("Cargo.toml")));
        assert!(filter.allows(Path::new("src/lib.rs")));
        assert!(!filter.allows(Path::new("README.md")));
    }

    #[test]
    fn test_suffix_is_not_extension_only() {
        let filter = PathFilter::new(["_test.rs", ".tar.gz"]);
        assert!(filter.allows(Path::new("src/parser_test.rs")));
        assert!(!filter.allows(Path::new("src/parser.rs")));
        assert!(filter.allows(Path::new("dist/release.tar.gz")));
        assert!(!filter.allows(Path::new("dist/release.gz")));
    }

    #[test]
    fn test_suffix_without_dot() {
        // Plain string suffix, so "log" matches both "app.log" and "backlog".
        let filter = PathFilter::new(["log"]);
        assert!(filter.allows(Path::new("app.log")));
        assert!(filter.allows(Path::new("backlog")));
        assert!(!filter.allows(Path::new("logs")));
    }
}
