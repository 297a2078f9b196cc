//! Directory tree registration.
//!
//! Walks a subtree pre-order and registers every directory with the watch
//! primitive. Each newly registered directory is reported as created, which
//! is how directories that already exist at start-up reach the callback.
//! Files are never reported by the walk.

use std::path::Path;

use walkdir::WalkDir;

use super::context::WatchContext;
use super::events::ChangeKind;
use super::primitive::WatchPrimitive;
use super::registry::SubscriptionRegistry;
use super::stats::WatcherStats;
use crate::config::WatchOptions;
use crate::error::WatcherError;
use crate::Result;

/// Outcome of a subtree walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Directories newly added to the registry.
    pub registered: u64,
    /// Branches skipped because they could not be read or watched.
    pub errors: u64,
}

/// Registers directories with a primitive and records them in a registry.
pub struct TreeRegistrar<'a> {
    primitive: &'a mut dyn WatchPrimitive,
    registry: &'a mut SubscriptionRegistry,
    ctx: &'a WatchContext,
    options: &'a WatchOptions,
}

impl<'a> TreeRegistrar<'a> {
    pub(crate) fn new(
        primitive: &'a mut dyn WatchPrimitive,
        registry: &'a mut SubscriptionRegistry,
        ctx: &'a WatchContext,
        options: &'a WatchOptions,
    ) -> Self {
        Self {
            primitive,
            registry,
            ctx,
            options,
        }
    }

    /// Register a single directory without walking or reporting it.
    ///
    /// Returns `true` if the directory was not watched before.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive refuses the directory.
    pub fn register(&mut self, dir: &Path) -> Result<bool> {
        let handle = self.primitive.register(dir)?;
        let added = self.registry.add(handle, dir);
        if added {
            WatcherStats::bump(&self.ctx.stats.directories_registered);
            tracing::debug!(path = %dir.display(), %handle, "Registered directory");
        }
        Ok(added)
    }

    /// Register `start` and every directory beneath it.
    ///
    /// Failures below `start` are logged and their branch is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` itself is not a directory or cannot be
    /// registered.
    pub fn register_all(&mut self, start: &Path) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        let mut walker = WalkDir::new(start).follow_links(false).into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(WatcherError::watch_failed(start, e).into());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to access directory");
                    WatcherStats::bump(&self.ctx.stats.registration_failures);
                    summary.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                if entry.depth() == 0 {
                    return Err(WatcherError::watch_failed(start, "not a directory").into());
                }
                continue;
            }

            match self.register(entry.path()) {
                Ok(true) => {
                    summary.registered += 1;
                    self.ctx
                        .emit(self.options, entry.path(), ChangeKind::Created, true);
                }
                Ok(false) => {}
                Err(e) if entry.depth() == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "Failed to register directory");
                    WatcherStats::bump(&self.ctx.stats.registration_failures);
                    summary.errors += 1;
                    walker.skip_current_dir();
                }
            }
        }

        tracing::debug!(
            path = %start.display(),
            registered = summary.registered,
            errors = summary.errors,
            "Directory walk complete"
        );

        Ok(summary)
    }
}
