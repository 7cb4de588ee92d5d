//! Data types sent to the client over WebSocket.
//! Keep this module minimal and stable — it defines the wire format.

use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DiskInfo {
    pub nome: String,
    /// used space, percent
    pub uso: f32,
    pub total: u64,
    pub disponivel: u64,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct ThreadInfo {
    pub total_threads: usize,
    pub active_threads: usize,
    pub thread_per_core: f32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Metrics {
    pub cpu_usage: f32,
    pub total_memory: u64,
    pub used_memory: u64,
    pub disk_usage: Vec<DiskInfo>,
    pub thread_metrics: ThreadInfo,
}
