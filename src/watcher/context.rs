//! State shared between a watcher facade and its dispatch thread.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::events::{ChangeKind, WatchCallback};
use super::stats::WatcherStats;
use crate::config::WatchOptions;

/// Generation-tagged running flag.
///
/// The low bit is the running flag; the remaining bits count runs. A
/// dispatch loop holds the token of its own run, so a loop left over from
/// an earlier run can neither keep running nor clear the flag of a later one.
#[derive(Debug, Default)]
pub(crate) struct RunState(AtomicU64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunToken(u64);

impl RunState {
    /// Enter a new run and mark it running.
    pub(crate) fn begin(&self) -> RunToken {
        let next = |state: u64| (((state >> 1) + 1) << 1) | 1;
        let prev = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| Some(next(s)))
            .unwrap_or_else(|s| s);
        RunToken(next(prev))
    }

    pub(crate) fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst) & 1 == 1
    }

    /// `true` while `token`'s run is the current one and still running.
    pub(crate) fn is_current(&self, token: RunToken) -> bool {
        self.0.load(Ordering::SeqCst) == token.0
    }

    /// Clear the running flag of whatever run is current.
    pub(crate) fn halt(&self) {
        self.0.fetch_and(!1, Ordering::SeqCst);
    }

    /// Clear the running flag only if `token`'s run is still current.
    pub(crate) fn finish(&self, token: RunToken) -> bool {
        self.0
            .compare_exchange(token.0, token.0 & !1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Everything the dispatch thread reads from the facade.
pub(crate) struct WatchContext {
    root: PathBuf,
    options: RwLock<WatchOptions>,
    callback: Arc<dyn WatchCallback>,
    pub(crate) stats: WatcherStats,
    pub(crate) run_state: RunState,
}

impl WatchContext {
    pub(crate) fn new(root: PathBuf, options: WatchOptions, callback: Arc<dyn WatchCallback>) -> Self {
        Self {
            root,
            options: RwLock::new(options),
            callback,
            stats: WatcherStats::new(),
            run_state: RunState::default(),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Copy of the current options.
    pub(crate) fn options(&self) -> WatchOptions {
        self.options.read().clone()
    }

    pub(crate) fn update_options(&self, update: impl FnOnce(&mut WatchOptions)) {
        let mut options = self.options.write();
        update(&mut *options);
    }

    /// Deliver a classified change, honoring directory suppression.
    pub(crate) fn emit(&self, options: &WatchOptions, path: &Path, kind: ChangeKind, is_dir: bool) {
        if is_dir && !options.notify_directories {
            tracing::trace!(path = %path.display(), %kind, "Notifications for directories are off");
            WatcherStats::bump(&self.stats.events_suppressed);
            return;
        }

        tracing::trace!(path = %path.display(), %kind, "Dispatching change");
        self.callback.on_change(path, kind);
        WatcherStats::bump(&self.stats.events_dispatched);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::events::ChangeEvent;
    use parking_lot::Mutex;

    #[test]
    fn test_run_state_cycles() {
        let state = RunState::default();
        assert!(!state.is_running());

        let first = state.begin();
        assert!(state.is_running());
        assert!(state.is_current(first));

        state.halt();
        assert!(!state.is_running());
        assert!(!state.is_current(first));

        let second = state.begin();
        assert_ne!(first, second);
        assert!(state.is_running());
    }

    #[test]
    fn test_stale_token_cannot_finish_new_run() {
        let state = RunState::default();
        let first = state.begin();
        state.halt();
        let second = state.begin();

        assert!(!state.finish(first));
        assert!(state.is_running());
        assert!(state.finish(second));
        assert!(!state.is_running());
    }

    #[test]
    fn test_emit_suppresses_directories_when_disabled() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let ctx = WatchContext::new(
            PathBuf::from("/root"),
            WatchOptions::default(),
            Arc::new(move |event: ChangeEvent| sink.lock().push(event)),
        );

        let mut options = ctx.options();
        options.notify_directories = false;
        ctx.emit(&options, Path::new("/root/dir"), ChangeKind::Created, true);
        ctx.emit(&options, Path::new("/root/file"), ChangeKind::Created, false);

        assert_eq!(*seen.lock(), vec![ChangeEvent::new("/root/file", ChangeKind::Created)]);
        let stats = ctx.stats.snapshot();
        assert_eq!(stats.events_suppressed, 1);
        assert_eq!(stats.events_dispatched, 1);
    }

    #[test]
    fn test_update_options() {
        let ctx = WatchContext::new(
            PathBuf::from("/root"),
            WatchOptions::default(),
            Arc::new(crate::watcher::LoggingCallback),
        );
        ctx.update_options(|o| o.max_depth = Some(4));
        assert_eq!(ctx.options().max_depth, Some(4));
    }
}
