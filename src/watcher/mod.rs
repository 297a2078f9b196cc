//! Directory watching.
//!
//! This module provides:
//! - A per-directory watch primitive seam, backed by notify-rs
//! - Tree registration for existing and newly created subdirectories
//! - Suffix filtering and depth bounds for what gets reported
//! - The dispatch loop and the [`DirectoryWatcher`] facade that runs it

mod backend;
mod context;
mod depth;
mod dispatch;
mod events;
mod filter;
mod primitive;
mod registry;
mod scanner;
mod stats;
#[allow(clippy::module_inception)]
mod watcher;

pub use backend::NotifyPrimitive;
pub use depth::{depth_of, within_depth};
pub use dispatch::{EventDispatchLoop, LoopExit};
pub use events::{ChangeEvent, ChangeKind, LoggingCallback, WatchCallback};
pub use filter::PathFilter;
pub use primitive::{
    close_channel, CloseHandle, RawBatch, RawEvent, RawEventKind, TakeError, WatchHandle,
    WatchPrimitive,
};
pub use registry::SubscriptionRegistry;
pub use scanner::{ScanSummary, TreeRegistrar};
pub use stats::{WatcherStats, WatcherStatsSnapshot};
pub use watcher::{DirectoryWatcher, PrimitiveFactory};
