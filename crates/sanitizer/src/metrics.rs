use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for sanitizer activity. Shared across threads through `Arc`.
#[derive(Debug, Default)]
pub struct SanitizerMetrics {
    /// Number of sanitize calls
    pub sanitize_calls: AtomicUsize,
    /// Number of validate calls
    pub validate_calls: AtomicUsize,
    /// Sanitize calls that failed closed
    pub rejections: AtomicUsize,
    /// Total `removed` entries produced
    pub removals: AtomicUsize,
    /// Sanitize calls whose output was cut to the rule limit
    pub truncations: AtomicUsize,
}

/// Point-in-time copy of [`SanitizerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub sanitize_calls: usize,
    pub validate_calls: usize,
    pub rejections: usize,
    pub removals: usize,
    pub truncations: usize,
}

impl SanitizerMetrics {
    /// Create new sanitizer metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sanitize(&self) {
        self.sanitize_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validate(&self) {
        self.validate_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removals(&self, count: usize) {
        self.removals.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_truncation(&self) {
        self.truncations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sanitize_calls: self.sanitize_calls.load(Ordering::Relaxed),
            validate_calls: self.validate_calls.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            truncations: self.truncations.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.sanitize_calls.store(0, Ordering::Relaxed);
        self.validate_calls.store(0, Ordering::Relaxed);
        self.rejections.store(0, Ordering::Relaxed);
        self.removals.store(0, Ordering::Relaxed);
        self.truncations.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_counters() {
        let metrics = SanitizerMetrics::new();

        metrics.record_sanitize();
        metrics.record_sanitize();
        metrics.record_removals(3);
        metrics.record_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sanitize_calls, 2);
        assert_eq!(snapshot.removals, 3);
        assert_eq!(snapshot.rejections, 1);
        assert_eq!(snapshot.validate_calls, 0);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_thread_safety() {
        let metrics = Arc::new(SanitizerMetrics::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let metrics = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    metrics.record_sanitize();
                    metrics.record_removals(2);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.sanitize_calls.load(Ordering::Relaxed), 1000);
        assert_eq!(metrics.removals.load(Ordering::Relaxed), 2000);
    }
}
