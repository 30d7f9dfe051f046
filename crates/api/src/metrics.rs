use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_run_time_us: AtomicU64,
    total_scan_time_us: AtomicU64,

    // Counts
    pipeline_runs: AtomicUsize,
    scans_executed: AtomicUsize,
    items_verified: AtomicUsize,
    false_positives_blocked: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_run_time_us: AtomicU64::new(0),
            total_scan_time_us: AtomicU64::new(0),
            pipeline_runs: AtomicUsize::new(0),
            scans_executed: AtomicUsize::new(0),
            items_verified: AtomicUsize::new(0),
            false_positives_blocked: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_run(&self, duration: std::time::Duration, verified: usize, blocked: usize) {
        self.total_run_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.pipeline_runs.fetch_add(1, Ordering::Relaxed);
        self.items_verified.fetch_add(verified, Ordering::Relaxed);
        self.false_positives_blocked.fetch_add(blocked, Ordering::Relaxed);
    }

    pub fn record_scan(&self, duration: std::time::Duration) {
        self.total_scan_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.scans_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_run_time_ms: self.avg_time_ms(&self.total_run_time_us, &self.pipeline_runs),
            avg_scan_time_ms: self.avg_time_ms(&self.total_scan_time_us, &self.scans_executed),
            pipeline_runs: self.pipeline_runs.load(Ordering::Relaxed),
            scans_executed: self.scans_executed.load(Ordering::Relaxed),
            items_verified: self.items_verified.load(Ordering::Relaxed),
            false_positives_blocked: self.false_positives_blocked.load(Ordering::Relaxed),
        }
    }

    fn avg_time_ms(&self, total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
        let total = total_us.load(Ordering::Relaxed) as f64;
        let cnt = count.load(Ordering::Relaxed) as f64;
        if cnt > 0.0 {
            total / cnt / 1000.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_run_time_ms: f64,
    pub avg_scan_time_ms: f64,
    pub pipeline_runs: usize,
    pub scans_executed: usize,
    pub items_verified: usize,
    pub false_positives_blocked: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
