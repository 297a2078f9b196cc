//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;

/// Options controlling what a [`DirectoryWatcher`](crate::watcher::DirectoryWatcher)
/// registers and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Watch nested subdirectories as well as the root.
    pub recursive: bool,

    /// Depth bound for directories created after start-up.
    ///
    /// `None` means unbounded. The initial walk at start-up ignores this
    /// value and registers the whole pre-existing tree.
    pub max_depth: Option<usize>,

    /// Path suffixes that qualify for notification. Empty allows everything.
    pub file_filters: Vec<String>,

    /// Deliver callbacks for directory paths.
    pub notify_directories: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: None,
            file_filters: Vec::new(),
            notify_directories: true,
        }
    }
}

impl WatchOptions {
    /// Options for a watcher with unbounded depth and no filters.
    #[must_use]
    pub fn new(recursive: bool) -> Self {
        Self {
            recursive,
            ..Self::default()
        }
    }

    /// Options with an explicit depth bound and suffix filters.
    #[must_use]
    pub fn with_limits(recursive: bool, max_depth: Option<usize>, file_filters: Vec<String>) -> Self {
        Self {
            recursive,
            max_depth,
            file_filters,
            notify_directories: true,
        }
    }

    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns an error if a file filter is empty.
    pub fn validate(&self) -> Result<()> {
        validate_filters(&self.file_filters)
    }
}

/// Reject empty suffixes, which would silently match every path.
pub(crate) fn validate_filters(filters: &[String]) -> Result<()> {
    if filters.iter().any(String::is_empty) {
        return Err(Error::config("file filter cannot be empty"));
    }
    Ok(())
}

/// Configuration for the `dirwatch` command-line tool.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory to watch.
    pub root: PathBuf,

    /// Watch behavior.
    pub watch: WatchOptions,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,

    /// Print events as JSON lines instead of plain text.
    pub json_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            watch: WatchOptions::default(),
            log_level: "info".to_string(),
            log_json: false,
            json_events: false,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::config("root path cannot be empty"));
        }

        if !self.root.is_dir() {
            return Err(Error::config(format!(
                "root path '{}' is not a directory",
                self.root.display()
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        self.watch.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_watch_options() {
        let options = WatchOptions::default();
        assert!(options.recursive);
        assert_eq!(options.max_depth, None);
        assert!(options.file_filters.is_empty());
        assert!(options.notify_directories);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_watch_options_new() {
        let options = WatchOptions::new(false);
        assert!(!options.recursive);
        assert_eq!(options.max_depth, None);
    }

    #[test]
    fn test_watch_options_with_limits() {
        let options = WatchOptions::with_limits(true, Some(3), vec![".png".to_string()]);
        assert_eq!(options.max_depth, Some(3));
        assert_eq!(options.file_filters, vec![".png".to_string()]);
        assert!(options.notify_directories);
    }

    #[test]
    fn test_validate_empty_filter() {
        let options = WatchOptions::with_limits(true, None, vec![".rs".to_string(), String::new()]);
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("file filter"));
    }

    #[test]
    fn test_default_config_validates_in_cwd() {
        let config = Config::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_root() {
        let config = Config {
            root: PathBuf::from("/nonexistent/dirwatch/root"),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_validate_empty_root() {
        let config = Config {
            root: PathBuf::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("root path"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            root: tmp.path().to_path_buf(),
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                root: tmp.path().to_path_buf(),
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }

    #[test]
    fn test_validate_propagates_watch_options() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            root: tmp.path().to_path_buf(),
            watch: WatchOptions::with_limits(true, None, vec![String::new()]),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
