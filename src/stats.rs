//! Process-wide run counters.
//!
//! One `CrawlStats` is created per run and threaded through the engine as an
//! explicit dependency. All counters are atomic so workers update them
//! without coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic counters for a single crawl run.
#[derive(Debug)]
pub struct CrawlStats {
    /// Up-front estimate of discoverable files. Progress reporting only,
    /// never a correctness input.
    pub files_total: AtomicU64,
    /// Files whose extraction succeeded and whose record was emitted.
    pub files_processed: AtomicU64,
    /// Files skipped because they were already claimed or deduplicated.
    pub files_skipped: AtomicU64,
    /// Files whose extraction failed or timed out.
    pub files_error: AtomicU64,
    /// Nested files dropped at the depth or fan-out limit.
    pub nested_dropped: AtomicU64,
    start: Instant,
    /// Unix seconds at run start; stamped into emitted records.
    pub start_unix: i64,
}

impl CrawlStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            files_total: AtomicU64::new(0),
            files_processed: AtomicU64::new(0),
            files_skipped: AtomicU64::new(0),
            files_error: AtomicU64::new(0),
            nested_dropped: AtomicU64::new(0),
            start: Instant::now(),
            start_unix: chrono::Utc::now().timestamp(),
        }
    }

    pub fn add_total(&self, n: u64) {
        self.files_total.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.files_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_nested_dropped(&self) {
        self.nested_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Immutable snapshot for logging and the final summary.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_total: self.files_total.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_error: self.files_error.load(Ordering::Relaxed),
            nested_dropped: self.nested_dropped.load(Ordering::Relaxed),
            elapsed_secs: self.start.elapsed().as_secs(),
        }
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct StatsSnapshot {
    pub files_total: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_error: u64,
    pub nested_dropped: u64,
    pub elapsed_secs: u64,
}

impl StatsSnapshot {
    /// Files visited in any way this run.
    #[must_use]
    pub fn files_visited(&self) -> u64 {
        self.files_processed + self.files_skipped + self.files_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = CrawlStats::new();
        stats.add_total(10);
        stats.record_processed();
        stats.record_processed();
        stats.record_skipped();
        stats.record_error();

        let snap = stats.snapshot();
        assert_eq!(snap.files_total, 10);
        assert_eq!(snap.files_processed, 2);
        assert_eq!(snap.files_skipped, 1);
        assert_eq!(snap.files_error, 1);
        assert_eq!(snap.files_visited(), 4);
    }
}
