//! The event dispatch loop.
//!
//! Runs on the watcher's dedicated thread. Each iteration blocks for one raw
//! batch, resolves it to its directory, registers newly created
//! subdirectories when recursion allows, and hands everything else that
//! passes the suffix filter to the callback.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::context::{RunToken, WatchContext};
use super::depth::within_depth;
use super::events::ChangeKind;
use super::filter::PathFilter;
use super::primitive::{RawBatch, RawEventKind, TakeError, WatchPrimitive};
use super::registry::SubscriptionRegistry;
use super::scanner::TreeRegistrar;
use super::stats::WatcherStats;
use crate::Result;

/// Why a dispatch loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The running flag was cleared.
    Stopped,
    /// The primitive was closed.
    Closed,
    /// Every watched directory became inaccessible.
    Exhausted,
    /// The event source disconnected.
    Interrupted(String),
}

/// Owns one run's primitive and registry.
pub struct EventDispatchLoop {
    primitive: Box<dyn WatchPrimitive>,
    registry: SubscriptionRegistry,
    ctx: Arc<WatchContext>,
    token: RunToken,
}

impl EventDispatchLoop {
    pub(crate) fn new(primitive: Box<dyn WatchPrimitive>, ctx: Arc<WatchContext>, token: RunToken) -> Self {
        Self {
            primitive,
            registry: SubscriptionRegistry::new(),
            ctx,
            token,
        }
    }

    /// Initial registration: the whole tree when recursive, else the root only.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be registered.
    pub(crate) fn setup(&mut self) -> Result<()> {
        let options = self.ctx.options();
        let root = self.ctx.root().to_path_buf();
        let mut registrar =
            TreeRegistrar::new(self.primitive.as_mut(), &mut self.registry, &self.ctx, &options);

        if options.recursive {
            let summary = registrar.register_all(&root)?;
            tracing::info!(
                path = %root.display(),
                registered = summary.registered,
                errors = summary.errors,
                "Watching directory tree"
            );
        } else {
            registrar.register(&root)?;
            tracing::info!(path = %root.display(), "Watching directory");
        }

        Ok(())
    }

    /// Process batches until stopped, closed, interrupted, or out of directories.
    pub(crate) fn run(mut self) -> LoopExit {
        let exit = loop {
            if !self.ctx.run_state.is_current(self.token) {
                break LoopExit::Stopped;
            }

            let batch = match self.primitive.take() {
                Ok(batch) => batch,
                Err(TakeError::Closed) => break LoopExit::Closed,
                Err(TakeError::Interrupted(reason)) => {
                    tracing::warn!(%reason, "Dispatch loop interrupted");
                    self.primitive.close_handle().close();
                    break LoopExit::Interrupted(reason);
                }
            };

            if !self.process_batch(batch) {
                break LoopExit::Exhausted;
            }
        };

        self.ctx.run_state.finish(self.token);
        tracing::info!(path = %self.ctx.root().display(), ?exit, "Dispatch loop stopped");
        exit
    }

    /// Handle one batch. Returns `false` once nothing is left to watch.
    fn process_batch(&mut self, batch: RawBatch) -> bool {
        let Some(dir) = self.registry.path_for(batch.handle).map(Path::to_path_buf) else {
            tracing::trace!(handle = %batch.handle, "Skipping batch for unknown subscription");
            WatcherStats::bump(&self.ctx.stats.stale_batches);
            return true;
        };

        let options = self.ctx.options();
        let filter = PathFilter::new(options.file_filters.iter().cloned());

        for event in batch.events {
            let child = dir.join(&event.name);
            let is_dir = is_directory(&child);

            if is_dir
                && options.recursive
                && event.kind == RawEventKind::Created
                && within_depth(&child, self.ctx.root(), options.max_depth)
            {
                let mut registrar =
                    TreeRegistrar::new(self.primitive.as_mut(), &mut self.registry, &self.ctx, &options);
                if let Err(e) = registrar.register_all(&child) {
                    tracing::warn!(path = %child.display(), error = %e, "Failed to access directory");
                    WatcherStats::bump(&self.ctx.stats.registration_failures);
                }
            } else if filter.allows(&child) {
                let Some(kind) = ChangeKind::from_raw(event.kind) else {
                    continue;
                };
                let is_dir = is_dir || self.registry.watches(&child);
                self.ctx.emit(&options, &child, kind, is_dir);
            } else {
                WatcherStats::bump(&self.ctx.stats.events_filtered);
            }
        }

        if !self.primitive.reset(batch.handle) {
            if let Some(path) = self.registry.remove(batch.handle) {
                tracing::debug!(path = %path.display(), "Directory no longer accessible");
            }
            if self.registry.is_empty() {
                tracing::info!("No directories left to watch");
                return false;
            }
        }

        true
    }
}

/// Directory check that does not follow symlinks.
fn is_directory(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}
