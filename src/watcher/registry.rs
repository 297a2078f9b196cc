//! Live watch subscriptions, keyed by handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::primitive::WatchHandle;

/// Maps watch handles to the directories they watch.
///
/// Owned by the dispatch thread; never shared.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscriptions: HashMap<WatchHandle, PathBuf>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscription.
    ///
    /// Returns `false` if the handle was already present, in which case the
    /// existing mapping is kept.
    pub fn add(&mut self, handle: WatchHandle, path: impl Into<PathBuf>) -> bool {
        if self.subscriptions.contains_key(&handle) {
            return false;
        }
        self.subscriptions.insert(handle, path.into());
        true
    }

    /// Directory watched by `handle`, if any.
    #[must_use]
    pub fn path_for(&self, handle: WatchHandle) -> Option<&Path> {
        self.subscriptions.get(&handle).map(PathBuf::as_path)
    }

    /// Forget a subscription.
    pub fn remove(&mut self, handle: WatchHandle) -> Option<PathBuf> {
        self.subscriptions.remove(&handle)
    }

    /// `true` if some subscription watches `path`.
    #[must_use]
    pub fn watches(&self, path: &Path) -> bool {
        self.subscriptions.values().any(|p| p == path)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }
}
