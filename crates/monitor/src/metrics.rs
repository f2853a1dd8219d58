use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct PipelineMetrics {
    // Counters
    files_summarized: AtomicUsize,
    files_failed: AtomicUsize,
    uploads_summarized: AtomicUsize,
    scans: AtomicUsize,
    scan_errors: AtomicUsize,

    // Chunks
    chunks_summarized: AtomicUsize,
    chunks_dropped: AtomicUsize,

    // Timing (in microseconds)
    total_processing_time_us: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file(&self, success: bool, duration: Duration) {
        if success {
            self.files_summarized.fetch_add(1, Ordering::Relaxed);
        } else {
            self.files_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_processing_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_upload(&self) {
        self.uploads_summarized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunks(&self, summarized: usize, dropped: usize) {
        self.chunks_summarized.fetch_add(summarized, Ordering::Relaxed);
        self.chunks_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    pub fn record_scan(&self, success: bool) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.scan_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let summarized = self.files_summarized.load(Ordering::Relaxed);
        let failed = self.files_failed.load(Ordering::Relaxed);

        MetricsSnapshot {
            files_summarized: summarized,
            files_failed: failed,
            uploads_summarized: self.uploads_summarized.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            scan_errors: self.scan_errors.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            avg_processing_time_ms: avg_time_ms(&self.total_processing_time_us, summarized + failed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: usize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    if count > 0 {
        total / count as f64 / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub files_summarized: usize,
    pub files_failed: usize,
    pub uploads_summarized: usize,
    pub scans: usize,
    pub scan_errors: usize,
    pub chunks_summarized: usize,
    pub chunks_dropped: usize,
    pub avg_processing_time_ms: f64,
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

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages_over_files() {
        let metrics = PipelineMetrics::new();
        metrics.record_file(true, Duration::from_millis(10));
        metrics.record_file(false, Duration::from_millis(30));
        metrics.record_chunks(3, 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.files_summarized, 1);
        assert_eq!(snap.files_failed, 1);
        assert_eq!(snap.chunks_dropped, 1);
        assert!((snap.avg_processing_time_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = PipelineMetrics::new().snapshot();
        assert_eq!(snap.avg_processing_time_ms, 0.0);
    }
}
