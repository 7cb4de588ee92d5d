//! Normalized metrics record kept by the client, plus the values derived from it
//! at display time. Nothing here is stored pre-computed.

use chrono::{DateTime, Utc};

/// Wire sizes are bytes; the snapshot keeps gigabytes.
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub name: String,
    pub used_percent: f64,
    pub total_gb: f64,
    pub available_gb: f64,
}

impl DiskUsage {
    pub fn used_gb(&self) -> f64 {
        (self.total_gb - self.available_gb).max(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadMetrics {
    pub total_threads: u64,
    // not guaranteed to be <= total_threads
    pub active_threads: u64,
    pub threads_per_core: f64,
}

impl ThreadMetrics {
    pub fn active_percent(&self) -> f64 {
        ratio_percent(self.active_threads as f64, self.total_threads as f64)
    }
}

/// One received sample. Replaced as a whole on every message.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    /// Client-side capture time; the agent does not send one.
    pub timestamp: DateTime<Utc>,
    pub cpu_usage_percent: f64,
    pub total_memory_gb: f64,
    pub used_memory_gb: f64,
    /// Source order. Look volumes up by name, not by index.
    pub disk_volumes: Vec<DiskUsage>,
    pub threads: ThreadMetrics,
}

impl MetricsSnapshot {
    pub fn memory_used_percent(&self) -> f64 {
        ratio_percent(self.used_memory_gb, self.total_memory_gb)
    }

    pub fn disk(&self, name: &str) -> Option<&DiskUsage> {
        self.disk_volumes.iter().find(|d| d.name == name)
    }
}

/// `part / whole * 100`, clamped to 0..=100; zero when `whole` is not positive.
pub fn ratio_percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 && part.is_finite() {
        (part / whole * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Two-decimal rounding used for every percentage shown to the user.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
