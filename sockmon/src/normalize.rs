//! Turns loosely-typed agent JSON into a [`MetricsSnapshot`].
//!
//! Every field is coerced on its own: a missing or malformed value becomes zero
//! (or an empty list) and never poisons its neighbours. The only hard failure is
//! a payload that is not a JSON object at all.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::PayloadError;
use crate::types::{DiskUsage, MetricsSnapshot, ThreadMetrics, BYTES_PER_GB};

/// Decode one text frame and normalize it. Number literals outside the f64
/// range still decode and are zeroed field by field.
pub fn parse_message(text: &str) -> Result<MetricsSnapshot, PayloadError> {
    let raw: Value = serde_json::from_str(text)?;
    normalize(&raw)
}

/// Normalize a decoded payload, stamping it with the current time.
pub fn normalize(raw: &Value) -> Result<MetricsSnapshot, PayloadError> {
    normalize_at(raw, Utc::now())
}

pub fn normalize_at(
    raw: &Value,
    captured_at: DateTime<Utc>,
) -> Result<MetricsSnapshot, PayloadError> {
    let obj = raw.as_object().ok_or(PayloadError::NotAnObject)?;

    Ok(MetricsSnapshot {
        timestamp: captured_at,
        cpu_usage_percent: percent(obj, "cpu_usage"),
        total_memory_gb: gigabytes(obj, "total_memory"),
        used_memory_gb: gigabytes(obj, "used_memory"),
        disk_volumes: disks(obj.get("disk_usage")),
        threads: threads(obj.get("thread_metrics")),
    })
}

fn disks(v: Option<&Value>) -> Vec<DiskUsage> {
    let Some(list) = v.and_then(Value::as_array) else {
        if v.is_some_and(|v| !v.is_null()) {
            trace!("disk_usage is not an array; using empty list");
        }
        return Vec::new();
    };
    list.iter().map(disk).collect()
}

fn disk(v: &Value) -> DiskUsage {
    let empty = Map::new();
    let obj = v.as_object().unwrap_or(&empty);
    DiskUsage {
        name: obj
            .get("nome")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        used_percent: percent(obj, "uso"),
        total_gb: gigabytes(obj, "total"),
        available_gb: gigabytes(obj, "disponivel"),
    }
}

fn threads(v: Option<&Value>) -> ThreadMetrics {
    let Some(obj) = v.and_then(Value::as_object) else {
        return ThreadMetrics::default();
    };
    ThreadMetrics {
        total_threads: count(obj, "total_threads"),
        active_threads: count(obj, "active_threads"),
        threads_per_core: non_negative(obj, "thread_per_core"),
    }
}

// Only real JSON numbers count; strings, bools and containers default to zero.
fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = obj.get(key).and_then(Value::as_f64).filter(|n| n.is_finite());
    if n.is_none() {
        trace!(field = key, "defaulted to 0");
    }
    n
}

fn percent(obj: &Map<String, Value>, key: &str) -> f64 {
    number(obj, key).map_or(0.0, |n| n.clamp(0.0, 100.0))
}

fn non_negative(obj: &Map<String, Value>, key: &str) -> f64 {
    number(obj, key).map_or(0.0, |n| n.max(0.0))
}

fn gigabytes(obj: &Map<String, Value>, key: &str) -> f64 {
    non_negative(obj, key) / BYTES_PER_GB
}

fn count(obj: &Map<String, Value>, key: &str) -> u64 {
    // float-to-int `as` saturates, so huge values cannot wrap
    number(obj, key).map_or(0, |n| n.max(0.0).trunc() as u64)
}
