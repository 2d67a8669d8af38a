//! Pipeline metrics
//!
//! Relaxed atomic counters updated from the dispatch loop (and, for
//! overloads, from injection failures observed there). A clonable
//! handle survives `start()` so callers can snapshot a running
//! pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for everything the dispatch loop does
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Messages that entered the loop (source-produced and injected)
    produced: AtomicU64,

    /// Messages that reached a sink and completed
    delivered: AtomicU64,

    /// Messages a filter dropped on purpose
    dropped: AtomicU64,

    /// Messages terminated by a filter/sink error
    filter_errors: AtomicU64,

    /// Jobs accepted by the worker pool
    jobs_submitted: AtomicU64,

    /// Job results that came back successfully
    jobs_completed: AtomicU64,

    /// Job results that came back as failures (including panics)
    jobs_failed: AtomicU64,

    /// Offload submissions rejected because the queue was full
    overloads: AtomicU64,

    /// Jobs abandoned by a stop timeout
    abandoned: AtomicU64,
}

impl PipelineMetrics {
    /// Create a zeroed metrics instance
    pub const fn new() -> Self {
        Self {
            produced: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            filter_errors: AtomicU64::new(0),
            jobs_submitted: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            overloads: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_filter_error(&self) {
        self.filter_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_job_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_job_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_overload(&self) {
        self.overloads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_abandoned(&self, count: u64) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            filter_errors: self.filter_errors.load(Ordering::Relaxed),
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            overloads: self.overloads.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub produced: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub filter_errors: u64,
    pub jobs_submitted: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub overloads: u64,
    pub abandoned: u64,
}

/// Handle for reading metrics of a running pipeline
///
/// Remains valid after `Pipeline::start` consumes the pipeline.
#[derive(Clone, Debug)]
pub struct PipelineMetricsHandle {
    metrics: Arc<PipelineMetrics>,
}

impl PipelineMetricsHandle {
    pub(crate) fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self { metrics }
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recordings() {
        let metrics = PipelineMetrics::new();
        metrics.record_produced();
        metrics.record_produced();
        metrics.record_delivered();
        metrics.record_dropped();
        metrics.record_abandoned(2);

        let s = metrics.snapshot();
        assert_eq!(s.produced, 2);
        assert_eq!(s.delivered, 1);
        assert_eq!(s.dropped, 1);
        assert_eq!(s.abandoned, 2);
        assert_eq!(s.jobs_submitted, 0);
    }

    #[test]
    fn test_handle_shares_counters() {
        let metrics = Arc::new(PipelineMetrics::new());
        let handle = PipelineMetricsHandle::new(Arc::clone(&metrics));

        metrics.record_overload();
        assert_eq!(handle.snapshot().overloads, 1);
    }
}
