//! Progress reporting abstraction for crawl operations.
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting and
//! provides a no-op implementation plus a tracing-backed one.

use std::path::Path;

use tracing::info;

use crate::stats::StatsSnapshot;

/// Trait for reporting crawl progress at key lifecycle events.
///
/// Implementations can send updates to channels, log to console, update UI,
/// etc. The same engine drives both silent and reporting invocations.
pub trait ProgressReporter: Send + Sync {
    /// Discovery of the root has started.
    fn report_discovery_started(&self, root: &Path);

    /// The up-front total estimate is known.
    fn report_total_estimated(&self, total: u64);

    /// One file finished its pipeline (emitted, skipped or errored).
    fn report_file_done(&self, path: &Path);

    /// Periodic counter summary.
    fn report_periodic(&self, snapshot: &StatsSnapshot);

    /// The run finished.
    fn report_completed(&self, snapshot: &StatsSnapshot);
}

/// Progress reporter that does nothing.
#[derive(Debug, Clone, Copy)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_discovery_started(&self, _root: &Path) {}

    #[inline(always)]
    fn report_total_estimated(&self, _total: u64) {}

    #[inline(always)]
    fn report_file_done(&self, _path: &Path) {}

    #[inline(always)]
    fn report_periodic(&self, _snapshot: &StatsSnapshot) {}

    #[inline(always)]
    fn report_completed(&self, _snapshot: &StatsSnapshot) {}
}

/// Progress reporter backed by the tracing subscriber.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_discovery_started(&self, root: &Path) {
        info!(root = %root.display(), "discovery started");
    }

    fn report_total_estimated(&self, total: u64) {
        info!(total, "discovery estimate");
    }

    fn report_file_done(&self, _path: &Path) {}

    fn report_periodic(&self, snapshot: &StatsSnapshot) {
        info!(
            processed = snapshot.files_processed,
            skipped = snapshot.files_skipped,
            errors = snapshot.files_error,
            total = snapshot.files_total,
            elapsed_secs = snapshot.elapsed_secs,
            "crawl progress"
        );
    }

    fn report_completed(&self, snapshot: &StatsSnapshot) {
        info!(
            processed = snapshot.files_processed,
            skipped = snapshot.files_skipped,
            errors = snapshot.files_error,
            nested_dropped = snapshot.nested_dropped,
            elapsed_secs = snapshot.elapsed_secs,
            "crawl completed"
        );
    }
}
