//! Shared agent state: sysinfo handles and the hot JSON cache.

use std::sync::Arc;
use std::time::Duration;

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, ProcessRefreshKind, RefreshKind, System};
use tokio::sync::{Mutex, RwLock};

pub type SharedSystem = Arc<Mutex<System>>;
pub type SharedDisks = Arc<Mutex<Disks>>;

#[derive(Clone)]
pub struct AppState {
    // Persistent sysinfo handles; CPU usage needs the previous refresh to diff against
    pub sys: SharedSystem,
    pub disks: SharedDisks,

    // Last serialized JSON payload pushed to every client
    pub last_json: Arc<RwLock<String>>,

    pub interval: Duration,
}

impl AppState {
    pub fn new(interval: Duration) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything())
            .with_processes(ProcessRefreshKind::everything());
        let sys = System::new_with_specifics(refresh_kind);
        Self::with_system(sys, Disks::new_with_refreshed_list(), interval)
    }

    pub fn with_system(sys: System, disks: Disks, interval: Duration) -> Self {
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(disks)),
            last_json: Arc::new(RwLock::new(String::new())),
            interval,
        }
    }
}
