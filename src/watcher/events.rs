//! Change event types and the callback interface.

#![allow(clippy::missing_const_for_fn)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::primitive::RawEventKind;

/// Kind of change delivered to callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Entry was created (or already existed when watching began).
    Created,
    /// Entry was modified.
    Modified,
    /// Entry was removed.
    Removed,
}

impl ChangeKind {
    /// Classify a raw event kind. Kinds without a callback map to `None`.
    #[must_use]
    pub fn from_raw(kind: RawEventKind) -> Option<Self> {
        match kind {
            RawEventKind::Created => Some(Self::Created),
            RawEventKind::Modified => Some(Self::Modified),
            RawEventKind::Removed => Some(Self::Removed),
            RawEventKind::Other => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved change: the concrete path and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Receives change notifications from a watcher.
///
/// Methods run synchronously on the dispatch thread. A callback that blocks
/// stalls the watcher until it returns.
///
/// The default implementations only log. Closures taking a [`ChangeEvent`]
/// implement this trait directly.
pub trait WatchCallback: Send + Sync + 'static {
    fn path_created(&self, path: &Path) {
        tracing::debug!(path = %path.display(), "Path created");
    }

    fn path_modified(&self, path: &Path) {
        tracing::debug!(path = %path.display(), "Path modified");
    }

    fn path_removed(&self, path: &Path) {
        tracing::debug!(path = %path.display(), "Path removed");
    }

    /// Route a classified change to the matching method.
    fn on_change(&self, path: &Path, kind: ChangeKind) {
        match kind {
            ChangeKind::Created => self.path_created(path),
            ChangeKind::Modified => self.path_modified(path),
            ChangeKind::Removed => self.path_removed(path),
        }
    }
}

impl<F> WatchCallback for F
where
    F: Fn(ChangeEvent) + Send + Sync + 'static,
{
    fn path_created(&self, path: &Path) {
        self(ChangeEvent::new(path, ChangeKind::Created));
    }

    fn path_modified(&self, path: &Path) {
        self(ChangeEvent::new(path, ChangeKind::Modified));
    }

    fn path_removed(&self, path: &Path) {
        self(ChangeEvent::new(path, ChangeKind::Removed));
    }
}

/// Callback that only logs each change.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCallback;

impl WatchCallback for LoggingCallback {}
