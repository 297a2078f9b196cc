//! Dispatch statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the dispatch thread.
#[derive(Debug, Default)]
pub struct WatcherStats {
    pub directories_registered: AtomicU64,
    pub registration_failures: AtomicU64,
    pub events_dispatched: AtomicU64,
    pub events_filtered: AtomicU64,
    pub events_suppressed: AtomicU64,
    pub stale_batches: AtomicU64,
}

impl WatcherStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> WatcherStatsSnapshot {
        WatcherStatsSnapshot {
            directories_registered: self.directories_registered.load(Ordering::Relaxed),
            registration_failures: self.registration_failures.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            events_filtered: self.events_filtered.load(Ordering::Relaxed),
            events_suppressed: self.events_suppressed.load(Ordering::Relaxed),
            stale_batches: self.stale_batches.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of watcher stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherStatsSnapshot {
    pub directories_registered: u64,
    pub registration_failures: u64,
    pub events_dispatched: u64,
    pub events_filtered: u64,
    pub events_suppressed: u64,
    pub stale_batches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_start_at_zero() {
        let stats = WatcherStats::new();
        assert_eq!(stats.snapshot(), WatcherStatsSnapshot::default());
    }

    #[test]
    fn test_snapshot_reflects_updates() {
        let stats = WatcherStats::new();
        WatcherStats::bump(&stats.directories_registered);
        WatcherStats::bump(&stats.directories_registered);
        WatcherStats::bump(&stats.events_filtered);
        stats.events_dispatched.fetch_add(5, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.directories_registered, 2);
        assert_eq!(snapshot.events_filtered, 1);
        assert_eq!(snapshot.events_dispatched, 5);
        assert_eq!(snapshot.stale_batches, 0);
    }
}
