//! Tests for error types.

use super::*;
use std::path::Path;

#[test]
fn test_error_display() {
    let err = Error::config("empty file filter");
    assert_eq!(err.to_string(), "configuration error: empty file filter");
}

#[test]
fn test_watch_failed_display() {
    let err = WatcherError::watch_failed(Path::new("/tmp/missing"), "no such directory");
    assert_eq!(
        err.to_string(),
        "failed to watch path '/tmp/missing': no such directory"
    );
}

#[test]
fn test_watcher_error_conversion() {
    let watch_err = WatcherError::WatchFailed {
        path: "/tmp/test".to_string(),
        reason: "permission denied".to_string(),
    };
    let err: Error = watch_err.into();
    assert!(matches!(err, Error::Watcher(_)));
    assert!(err.to_string().starts_with("watcher error:"));
}

#[test]
fn test_primitive_unavailable_display() {
    let err: Error = WatcherError::PrimitiveUnavailable("inotify limit reached".to_string()).into();
    assert_eq!(
        err.to_string(),
        "watcher error: watch primitive unavailable: inotify limit reached"
    );
}

#[test]
fn test_result_type_alias() {
    fn returns_ok() -> Result<i32> {
        Ok(42)
    }

    fn returns_err() -> Result<i32> {
        Err(Error::config("test error"))
    }

    assert!(returns_ok().is_ok());
    assert!(returns_err().is_err());
}

#[test]
fn test_error_debug_format() {
    let err: Error = WatcherError::DispatchExited.into();
    let debug_str = format!("{err:?}");
    assert!(debug_str.contains("Watcher"));
    assert!(debug_str.contains("DispatchExited"));
}
