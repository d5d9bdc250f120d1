use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters exposed on the bridge's `/stats` route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub batches: usize,
    pub batch_failures: usize,
    pub images_decoded: usize,
    pub images_skipped: usize,
    pub logins_granted: usize,
    pub logins_denied: usize,
    pub registrations: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_batch(&self, decoded: usize, skipped: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.batches += 1;
            metrics.images_decoded += decoded;
            metrics.images_skipped += skipped;
        }
    }

    pub fn record_batch_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.batch_failures += 1;
        }
    }

    pub fn record_login(&self, granted: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            if granted {
                metrics.logins_granted += 1;
            } else {
                metrics.logins_denied += 1;
            }
        }
    }

    pub fn record_registration(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.registrations += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|metrics| *metrics).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
