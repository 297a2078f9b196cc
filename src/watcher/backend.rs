//! OS-backed watch primitive using notify-rs.
//!
//! Each registered directory gets its own non-recursive OS watch. Raw
//! notify events arrive on a crossbeam channel, are mapped onto
//! [`RawEventKind`], and grouped into per-directory batches keyed by the
//! directory's [`WatchHandle`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crossbeam_channel::{select, Receiver};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::primitive::{
    close_channel, CloseHandle, RawBatch, RawEvent, RawEventKind, TakeError, WatchHandle,
    WatchPrimitive,
};
use crate::error::WatcherError;
use crate::Result;

/// [`WatchPrimitive`] over the platform's recommended notify backend.
pub struct NotifyPrimitive {
    watcher: RecommendedWatcher,
    event_rx: Receiver<notify::Result<Event>>,
    close_handle: CloseHandle,
    close_rx: Receiver<()>,
    handles: HashMap<PathBuf, WatchHandle>,
    paths: HashMap<WatchHandle, PathBuf>,
    invalid: HashSet<WatchHandle>,
    /// Watched directories already reported removed; cleared on re-creation.
    removed: HashSet<PathBuf>,
    ready: VecDeque<RawBatch>,
    next_id: u64,
    closed: bool,
}

impl NotifyPrimitive {
    /// Create a primitive with no registered directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS watcher cannot be created.
    pub fn new() -> Result<Self> {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            // The receiver only goes away with the primitive itself. The
            // sender is owned by notify's event thread; should that thread
            // end, the channel disconnects and `take` reports it.
            let _ = event_tx.send(result);
        })
        .map_err(|e| WatcherError::PrimitiveUnavailable(e.to_string()))?;

        let (close_handle, close_rx) = close_channel();

        Ok(Self {
            watcher,
            event_rx,
            close_handle,
            close_rx,
            handles: HashMap::new(),
            paths: HashMap::new(),
            invalid: HashSet::new(),
            removed: HashSet::new(),
            ready: VecDeque::new(),
            next_id: 1,
            closed: false,
        })
    }

    fn ingest(&mut self, result: notify::Result<Event>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Watch error");
                return;
            }
        };

        for (path, kind) in classify(&event) {
            self.route(&path, kind);
        }
    }

    /// Attach an event to the batch of the directory containing `path`.
    ///
    /// Removal of a watched directory is seen from both the directory and
    /// its parent, possibly in separate reads; it is reported once. The
    /// parent's events are queued ahead of the directory's own empty batch
    /// so dispatch still knows the path as a watched directory when it
    /// sees them.
    fn route(&mut self, path: &Path, kind: RawEventKind) {
        let mut invalidated = None;
        match kind {
            RawEventKind::Removed => {
                if self.removed.contains(path) {
                    return;
                }
                if let Some(&handle) = self.handles.get(path) {
                    self.removed.insert(path.to_path_buf());
                    self.invalid.insert(handle);
                    invalidated = Some(handle);
                }
            }
            RawEventKind::Created => {
                self.removed.remove(path);
            }
            RawEventKind::Modified | RawEventKind::Other => {}
        }

        self.route_to_parent(path, kind);

        if let Some(handle) = invalidated {
            self.push(handle, None);
        }
    }

    fn route_to_parent(&mut self, path: &Path, kind: RawEventKind) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        let Some(&handle) = self.handles.get(parent) else {
            tracing::trace!(path = %path.display(), "Event outside watched directories");
            return;
        };

        if kind == RawEventKind::Removed {
            self.push(handle, Some(RawEvent::new(RawEventKind::Modified, name)));
        }
        self.push(handle, Some(RawEvent::new(kind, name)));
    }

    fn push(&mut self, handle: WatchHandle, event: Option<RawEvent>) {
        match self.ready.back_mut() {
            Some(batch) if batch.handle == handle => batch.events.extend(event),
            _ => self.ready.push_back(RawBatch {
                handle,
                events: event.into_iter().collect(),
            }),
        }
    }

    fn forget(&mut self, handle: WatchHandle) -> Option<PathBuf> {
        self.invalid.remove(&handle);
        let path = self.paths.remove(&handle)?;
        if self.handles.get(&path) == Some(&handle) {
            self.handles.remove(&path);
        }
        Some(path)
    }
}

impl WatchPrimitive for NotifyPrimitive {
    fn register(&mut self, dir: &Path) -> Result<WatchHandle> {
        if let Some(&handle) = self.handles.get(dir) {
            if !self.invalid.contains(&handle) {
                return Ok(handle);
            }
            // Same path, new directory: the stale handle drains on its own.
            self.handles.remove(dir);
        }

        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::watch_failed(dir, e))?;

        let handle = WatchHandle::new(self.next_id);
        self.next_id += 1;
        self.removed.remove(dir);
        self.handles.insert(dir.to_path_buf(), handle);
        self.paths.insert(handle, dir.to_path_buf());
        Ok(handle)
    }

    fn take(&mut self) -> std::result::Result<RawBatch, TakeError> {
        loop {
            if self.close_rx.try_recv().is_ok() {
                self.closed = true;
            }
            if self.closed {
                return Err(TakeError::Closed);
            }
            if let Some(batch) = self.ready.pop_front() {
                return Ok(batch);
            }

            let woken = select! {
                recv(self.close_rx) -> _ => None,
                recv(self.event_rx) -> msg => Some(msg),
            };

            match woken {
                None => self.closed = true,
                Some(Ok(result)) => {
                    self.ingest(result);
                    while let Ok(result) = self.event_rx.try_recv() {
                        self.ingest(result);
                    }
                }
                Some(Err(_)) => {
                    return Err(TakeError::Interrupted(
                        "notify event channel disconnected".to_string(),
                    ));
                }
            }
        }
    }

    fn reset(&mut self, handle: WatchHandle) -> bool {
        let Some(path) = self.paths.get(&handle) else {
            return false;
        };
        if !self.invalid.contains(&handle) && path.is_dir() {
            return true;
        }

        let still_mapped = self.handles.get(path) == Some(&handle);
        if let Some(path) = self.forget(handle) {
            if still_mapped {
                if let Err(e) = self.watcher.unwatch(&path) {
                    tracing::trace!(path = %path.display(), error = %e, "Unwatch after removal");
                }
            }
        }
        false
    }

    fn close_handle(&self) -> CloseHandle {
        self.close_handle.clone()
    }
}

/// Map a notify event onto per-path raw kinds.
fn classify(event: &Event) -> Vec<(PathBuf, RawEventKind)> {
    let uniform = |kind: RawEventKind| -> Vec<(PathBuf, RawEventKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };

    match event.kind {
        EventKind::Create(_) => uniform(RawEventKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => uniform(RawEventKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => uniform(RawEventKind::Created),
        // Both halves were already delivered as From and To.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let kind = if p.exists() {
                    RawEventKind::Created
                } else {
                    RawEventKind::Removed
                };
                (p.clone(), kind)
            })
            .collect(),
        EventKind::Modify(_) => uniform(RawEventKind::Modified),
        EventKind::Remove(_) => uniform(RawEventKind::Removed),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => uniform(RawEventKind::Other),
    }
}
