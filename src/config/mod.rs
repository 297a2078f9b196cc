//! Configuration management for dirwatch.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Programmatic construction through [`WatchOptions`]

mod settings;

pub(crate) use settings::validate_filters;
pub use settings::{Config, WatchOptions};
