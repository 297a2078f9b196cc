//! The low-level change-notification seam.
//!
//! A [`WatchPrimitive`] registers single directories and hands back raw,
//! per-directory event batches. The dispatch loop is written against this
//! trait; [`NotifyPrimitive`](super::backend::NotifyPrimitive) is the OS-backed
//! implementation.

use std::fmt;
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};

use crate::Result;

/// Opaque identifier of one directory registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(u64);

impl WatchHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a raw event as reported by the primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    Created,
    Modified,
    Removed,
    /// Anything the callback contract has no slot for (access, overflow).
    Other,
}

/// A single entry-level change inside a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawEventKind,
    /// Entry name relative to the watched directory.
    pub name: PathBuf,
}

impl RawEvent {
    pub fn new(kind: RawEventKind, name: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Events for one registered directory.
///
/// An empty batch signals that the subscription changed state (for example
/// the directory went away) and should be reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatch {
    pub handle: WatchHandle,
    pub events: Vec<RawEvent>,
}

/// Why a blocking [`WatchPrimitive::take`] returned without a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeError {
    /// The primitive was closed through its [`CloseHandle`].
    Closed,
    /// The event source went away underneath the primitive.
    Interrupted(String),
}

impl fmt::Display for TakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("watch primitive closed"),
            Self::Interrupted(reason) => write!(f, "watch primitive interrupted: {reason}"),
        }
    }
}

/// Per-directory change notification.
///
/// `take` is called from a single consumer thread. Closing happens from any
/// thread through the [`CloseHandle`].
pub trait WatchPrimitive: Send {
    /// Start watching a single directory (not its children).
    ///
    /// Registering a directory that is already watched returns its
    /// existing handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched.
    fn register(&mut self, dir: &Path) -> Result<WatchHandle>;

    /// Block until the next batch is available or the primitive is closed.
    ///
    /// # Errors
    ///
    /// Returns [`TakeError::Closed`] after [`CloseHandle::close`], or
    /// [`TakeError::Interrupted`] if the event source disconnected.
    fn take(&mut self) -> std::result::Result<RawBatch, TakeError>;

    /// Re-arm a subscription after its batch was processed.
    ///
    /// Returns `false` when the directory is no longer accessible; the
    /// subscription is dropped in that case.
    fn reset(&mut self, handle: WatchHandle) -> bool;

    /// Handle that closes this primitive from another thread.
    fn close_handle(&self) -> CloseHandle;
}

/// Cross-thread close signal for a [`WatchPrimitive`].
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: Sender<()>,
}

impl CloseHandle {
    /// Wake a blocked `take` with [`TakeError::Closed`]. Idempotent.
    pub fn close(&self) {
        // Full means a close is already pending.
        let _ = self.tx.try_send(());
    }
}

/// Paired close handle and receiving end, for primitive implementations.
#[must_use]
pub fn close_channel() -> (CloseHandle, Receiver<()>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (CloseHandle { tx }, rx)
}
