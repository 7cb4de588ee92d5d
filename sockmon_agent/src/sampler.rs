//! Background sampler: periodically collects metrics and refreshes the JSON cache,
//! so each socket just reads and sends the cached payload.

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::metrics::collect_metrics;
use crate::state::AppState;
use crate::types::Metrics;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn spawn_sampler(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(state.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let metrics = collect_metrics(&state).await;
            debug!("{}", summary(&metrics));
            match serde_json::to_string(&metrics) {
                Ok(js) => {
                    trace!(bytes = js.len(), "sample cached");
                    *state.last_json.write().await = js;
                }
                Err(e) => warn!(error = %e, "failed to serialize metrics"),
            }
        }
    })
}

/// One-line digest of a sample for the debug log.
pub fn summary(m: &Metrics) -> String {
    format!(
        "sample: cpu {:.1}%, mem {:.1}/{:.1} GB, threads {}/{}",
        m.cpu_usage,
        m.used_memory as f64 / BYTES_PER_GB,
        m.total_memory as f64 / BYTES_PER_GB,
        m.thread_metrics.active_threads,
        m.thread_metrics.total_threads
    )
}
