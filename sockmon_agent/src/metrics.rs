//! Metrics collection using sysinfo for sockmon_agent.

use sysinfo::{Disks, ProcessesToUpdate, System};

use crate::state::AppState;
use crate::types::{DiskInfo, Metrics, ThreadInfo};

// A process counts as active above this CPU share
const ACTIVE_CPU_PCT: f32 = 0.1;

pub async fn collect_metrics(state: &AppState) -> Metrics {
    let mut sys = state.sys.lock().await;
    sys.refresh_cpu_all();
    sys.refresh_memory();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let mut disks = state.disks.lock().await;
    disks.refresh(true);

    Metrics {
        cpu_usage: sys.global_cpu_usage(),
        total_memory: sys.total_memory(),
        used_memory: sys.used_memory(),
        disk_usage: disk_usage(&disks),
        thread_metrics: thread_info(&sys),
    }
}

fn disk_usage(disks: &Disks) -> Vec<DiskInfo> {
    // Skip pseudo filesystems that report no capacity
    disks
        .list()
        .iter()
        .filter(|d| d.total_space() > 0)
        .map(|d| disk_info(&d.name().to_string_lossy(), d.total_space(), d.available_space()))
        .collect()
}

pub fn disk_info(name: &str, total: u64, available: u64) -> DiskInfo {
    let used = total.saturating_sub(available);
    let uso = if total > 0 { used as f64 / total as f64 * 100.0 } else { 0.0 };
    DiskInfo {
        nome: name.to_string(),
        uso: uso as f32,
        total,
        disponivel: available,
    }
}

fn thread_info(sys: &System) -> ThreadInfo {
    let mut counts = Vec::new();
    for p in sys.processes().values() {
        // Linux lists threads as processes too; count them through their parent
        if p.thread_kind().is_some() {
            continue;
        }
        let threads = p.tasks().map(|t| t.len()).unwrap_or(0).max(1);
        counts.push((threads, p.cpu_usage()));
    }
    summarize_threads(&counts, sys.cpus().len())
}

/// `(thread_count, cpu_usage)` per process.
pub fn summarize_threads(procs: &[(usize, f32)], n_cpus: usize) -> ThreadInfo {
    let total_threads: usize = procs.iter().map(|(n, _)| n).sum();
    let active_threads: usize = procs
        .iter()
        .filter(|(_, cpu)| *cpu > ACTIVE_CPU_PCT)
        .map(|(n, _)| n)
        .sum();
    ThreadInfo {
        total_threads,
        active_threads,
        thread_per_core: total_threads as f32 / n_cpus.max(1) as f32,
    }
}
