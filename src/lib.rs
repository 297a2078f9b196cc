//! Recursive, filterable directory watching.
//!
//! A [`DirectoryWatcher`] watches a root directory (optionally its whole
//! subtree) on a dedicated thread and reports created, modified, and
//! removed paths to a [`WatchCallback`]. Directories created while running
//! are picked up automatically, up to an optional depth bound, and file
//! notifications can be narrowed to a set of path suffixes.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod watcher;

pub use config::{Config, WatchOptions};
pub use error::{Error, Result, WatcherError};
pub use watcher::{ChangeEvent, ChangeKind, DirectoryWatcher, WatchCallback};
