//! Small UI helpers: sizes, truncation, icons, colors and the plain summary line.

use ratatui::style::Color;

use crate::types::{round2, MetricsSnapshot};

pub fn gb(v: f64) -> String {
    format!("{:.2}GB", v)
}

/// Gauge percent; input is already 0..=100 but rounding can overshoot.
pub fn gauge_pct(v: f64) -> u16 {
    v.clamp(0.0, 100.0).round() as u16
}

pub fn load_color(pct: f64) -> Color {
    if pct < 70.0 {
        Color::Green
    } else if pct < 90.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(n - right).collect();
    format!("{head}...{tail}")
}

pub fn disk_icon(name: &str) -> &'static str {
    let n = name.to_ascii_lowercase();
    if n.contains(':') { "🗄️" }
    else if n.contains("nvme") { "⚡" }
    else if n.contains("sd") { "💽" }
    else if n.contains("overlay") { "📦" }
    else { "🖴" }
}

/// One-line rendering of a snapshot, used by `--plain`.
pub fn summary_line(m: &MetricsSnapshot) -> String {
    let mut line = format!(
        "{} cpu {:.2}% | mem {:.2}/{:.2} GB ({:.2}%)",
        m.timestamp.format("%H:%M:%S"),
        round2(m.cpu_usage_percent),
        m.used_memory_gb,
        m.total_memory_gb,
        round2(m.memory_used_percent()),
    );
    for d in &m.disk_volumes {
        let name = if d.name.is_empty() { "?" } else { d.name.as_str() };
        line.push_str(&format!(
            " | {} {:.2}% ({:.2}/{:.2} GB)",
            name,
            round2(d.used_percent),
            d.used_gb(),
            d.total_gb
        ));
    }
    line.push_str(&format!(
        " | threads {}/{} ({:.2}%) {:.2}/core",
        m.threads.active_threads,
        m.threads.total_threads,
        round2(m.threads.active_percent()),
        m.threads.threads_per_core
    ));
    line
}
