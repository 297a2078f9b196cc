//! Directory watcher facade.
//!
//! Owns configuration and the dispatch thread; start, stop, and restart
//! happen here.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::backend::NotifyPrimitive;
use super::context::WatchContext;
use super::dispatch::EventDispatchLoop;
use super::events::WatchCallback;
use super::primitive::{CloseHandle, WatchPrimitive};
use super::stats::WatcherStatsSnapshot;
use crate::config::{validate_filters, WatchOptions};
use crate::error::WatcherError;
use crate::observability::spans;
use crate::Result;

/// Name of the dispatch thread.
const THREAD_NAME: &str = "directory-watcher";

/// Builds a fresh watch primitive for every run.
pub type PrimitiveFactory = Arc<dyn Fn() -> Result<Box<dyn WatchPrimitive>> + Send + Sync>;

struct ActiveRun {
    closer: CloseHandle,
    thread: JoinHandle<()>,
}

/// Watches a directory (and optionally its subtree) and reports changes to
/// a [`WatchCallback`] from a dedicated thread.
///
/// Options can be changed while running. The dispatch thread reads them
/// once per batch, so a change applies from the next batch on.
pub struct DirectoryWatcher {
    ctx: Arc<WatchContext>,
    factory: PrimitiveFactory,
    active: Mutex<Option<ActiveRun>>,
}

impl DirectoryWatcher {
    /// Create a watcher with unbounded depth and no file filters.
    pub fn new(root: impl Into<PathBuf>, recursive: bool, callback: impl WatchCallback) -> Self {
        Self::build(root.into(), WatchOptions::new(recursive), Arc::new(callback), notify_factory())
    }

    /// Create a watcher with explicit options.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid.
    pub fn with_options(
        root: impl Into<PathBuf>,
        options: WatchOptions,
        callback: impl WatchCallback,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(root.into(), options, Arc::new(callback), notify_factory()))
    }

    /// Create a watcher over a custom primitive.
    ///
    /// `factory` is called on every [`start`](Self::start); each run gets a
    /// primitive of its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid.
    pub fn with_primitive<F>(
        root: impl Into<PathBuf>,
        options: WatchOptions,
        callback: impl WatchCallback,
        factory: F,
    ) -> Result<Self>
    where
        F: Fn() -> Result<Box<dyn WatchPrimitive>> + Send + Sync + 'static,
    {
        options.validate()?;
        Ok(Self::build(root.into(), options, Arc::new(callback), Arc::new(factory)))
    }

    fn build(
        root: PathBuf,
        options: WatchOptions,
        callback: Arc<dyn WatchCallback>,
        factory: PrimitiveFactory,
    ) -> Self {
        Self {
            ctx: Arc::new(WatchContext::new(root, options, callback)),
            factory,
            active: Mutex::new(None),
        }
    }

    /// Start watching.
    ///
    /// Blocks until the dispatch thread has registered the root (and, when
    /// recursive, the whole existing tree), so every pre-existing directory
    /// has been reported as created by the time this returns. Calling
    /// `start` while running logs a warning and does nothing.
    ///
    /// Callbacks must not call `start` or `stop` while this is in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive cannot be created, the root cannot
    /// be registered, or the dispatch thread cannot be spawned.
    pub fn start(&self) -> Result<()> {
        let mut active = self.active.lock();

        if self.ctx.run_state.is_running() {
            tracing::warn!(root = %self.ctx.root().display(), "Directory watcher was already started");
            return Ok(());
        }

        // A run that ended on its own still has a thread to reap.
        if let Some(previous) = active.take() {
            previous.closer.close();
            join_dispatch(previous.thread);
        }

        let primitive = (self.factory)()?;
        let closer = primitive.close_handle();
        let token = self.ctx.run_state.begin();
        let mut dispatch = EventDispatchLoop::new(primitive, Arc::clone(&self.ctx), token);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<()>>(1);

        let ctx = Arc::clone(&self.ctx);
        let spawned = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let span = spans::watcher_span(ctx.root());
                let _guard = span.enter();

                let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
                    let setup = dispatch.setup();
                    let ready = setup.is_ok();
                    // Receiver is gone only if `start` itself unwound.
                    let _ = ready_tx.send(setup);
                    if ready {
                        dispatch.run();
                    }
                }));

                if outcome.is_err() {
                    tracing::error!("Dispatch thread panicked");
                    ctx.run_state.finish(token);
                }
            });

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.ctx.run_state.finish(token);
                return Err(WatcherError::Spawn(e.to_string()).into());
            }
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *active = Some(ActiveRun { closer, thread });
                tracing::info!(root = %self.ctx.root().display(), "Directory watcher started");
                Ok(())
            }
            Ok(Err(e)) => {
                self.ctx.run_state.finish(token);
                join_dispatch(thread);
                tracing::warn!(root = %self.ctx.root().display(), error = %e, "Unable to register root");
                Err(e)
            }
            Err(_) => {
                self.ctx.run_state.finish(token);
                join_dispatch(thread);
                Err(WatcherError::DispatchExited.into())
            }
        }
    }

    /// Stop watching. Safe to call at any time, any number of times.
    pub fn stop(&self) {
        let mut active = self.active.lock();
        self.ctx.run_state.halt();

        if let Some(run) = active.take() {
            run.closer.close();
            join_dispatch(run.thread);
            tracing::info!(root = %self.ctx.root().display(), "Directory watcher stopped");
        }
    }

    /// Alias for [`stop`](Self::stop).
    pub fn close(&self) {
        self.stop();
    }

    /// Stop, then start with a fresh primitive and thread.
    ///
    /// # Errors
    ///
    /// Returns any error from [`start`](Self::start).
    pub fn restart(&self) -> Result<()> {
        self.stop();
        self.start()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ctx.run_state.is_running()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.ctx.root()
    }

    #[must_use]
    pub fn is_recursive(&self) -> bool {
        self.ctx.options().recursive
    }

    /// Depth bound for directories created after start; `None` is unbounded.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.ctx.options().max_depth
    }

    pub fn set_max_depth(&self, max_depth: Option<usize>) {
        self.ctx.update_options(|o| o.max_depth = max_depth);
    }

    #[must_use]
    pub fn file_filters(&self) -> Vec<String> {
        self.ctx.options().file_filters
    }

    /// Replace the suffix filters. An empty set admits every path.
    ///
    /// # Errors
    ///
    /// Returns an error if any suffix is empty.
    pub fn set_file_filters<I, S>(&self, filters: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filters: Vec<String> = filters.into_iter().map(Into::into).collect();
        validate_filters(&filters)?;
        self.ctx.update_options(|o| o.file_filters = filters);
        Ok(())
    }

    #[must_use]
    pub fn notify_directories(&self) -> bool {
        self.ctx.options().notify_directories
    }

    /// Turn callbacks for directory paths on or off.
    pub fn set_notify_directories(&self, notify: bool) {
        self.ctx.update_options(|o| o.notify_directories = notify);
    }

    /// Counters accumulated across all runs.
    #[must_use]
    pub fn stats(&self) -> WatcherStatsSnapshot {
        self.ctx.stats.snapshot()
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("root", &self.ctx.root())
            .field("options", &self.ctx.options())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn notify_factory() -> PrimitiveFactory {
    Arc::new(|| Ok(Box::new(NotifyPrimitive::new()?) as Box<dyn WatchPrimitive>))
}

/// Join a dispatch thread unless it is the caller (a callback stopping its
/// own watcher); that thread exits once the callback returns.
fn join_dispatch(thread: JoinHandle<()>) {
    if thread.thread().id() == thread::current().id() {
        return;
    }
    if thread.join().is_err() {
        tracing::error!("Dispatch thread panicked");
    }
}
