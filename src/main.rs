//! dirwatch - Recursive directory change notification
//!
//! Entry point for the `dirwatch` command-line tool.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;

use dirwatch::observability::{init_tracing, TracingConfig};
use dirwatch::{ChangeEvent, ChangeKind, Config, DirectoryWatcher, WatchOptions};

/// dirwatch - Recursive directory change notification
#[derive(Parser, Debug)]
#[command(name = "dirwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to watch
    #[arg(env = "DIRWATCH_ROOT")]
    root: PathBuf,

    /// Watch subdirectories as well as the root
    #[arg(short, long, env = "DIRWATCH_RECURSIVE")]
    recursive: bool,

    /// Deepest level at which newly created directories are watched
    #[arg(short = 'd', long, env = "DIRWATCH_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// Path suffixes to report (e.g. `.png,.jpg`); everything when omitted
    #[arg(short, long, env = "DIRWATCH_FILTER", value_delimiter = ',')]
    filter: Vec<String>,

    /// Do not report directory paths
    #[arg(long, env = "DIRWATCH_NO_DIRECTORIES")]
    no_directories: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DIRWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "DIRWATCH_LOG_JSON")]
    log_json: bool,

    /// Print events as JSON lines
    #[arg(long, env = "DIRWATCH_JSON")]
    json: bool,
}

/// One printed event.
#[derive(Debug, Serialize)]
struct ChangeRecord<'a> {
    timestamp: DateTime<Utc>,
    kind: ChangeKind,
    path: &'a Path,
}

fn print_event(event: &ChangeEvent, json: bool) {
    let mut stdout = std::io::stdout().lock();
    let written = if json {
        let record = ChangeRecord {
            timestamp: Utc::now(),
            kind: event.kind,
            path: &event.path,
        };
        serde_json::to_writer(&mut stdout, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(stdout))
    } else {
        writeln!(stdout, "{:<8} {}", event.kind, event.path.display())
    };

    if let Err(e) = written {
        tracing::warn!(error = %e, "Failed to write event");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config {
        root: cli.root,
        watch: WatchOptions {
            recursive: cli.recursive,
            max_depth: cli.max_depth,
            file_filters: cli.filter,
            notify_directories: !cli.no_directories,
        },
        log_level: cli.log_level,
        log_json: cli.log_json,
        json_events: cli.json,
    };

    init_tracing(&TracingConfig {
        level: config.log_level.clone(),
        json: config.log_json,
    });

    tracing::info!("dirwatch v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!(?config, "Configuration loaded");

    config.validate().context("invalid configuration")?;

    let json = config.json_events;
    let watcher = DirectoryWatcher::with_options(
        config.root.clone(),
        config.watch.clone(),
        move |event: ChangeEvent| print_event(&event, json),
    )?;

    // Start blocks through the initial walk, so keep it off the runtime.
    let watcher = tokio::task::spawn_blocking(move || watcher.start().map(|()| watcher))
        .await
        .context("watcher start task failed")?
        .with_context(|| format!("failed to watch {}", config.root.display()))?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("Shutdown signal received");
    let stats = watcher.stats();
    tokio::task::spawn_blocking(move || watcher.stop())
        .await
        .context("watcher stop task failed")?;

    tracing::info!(
        directories = stats.directories_registered,
        dispatched = stats.events_dispatched,
        filtered = stats.events_filtered,
        "dirwatch stopped"
    );

    Ok(())
}
