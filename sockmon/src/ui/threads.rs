//! Active-thread gauge with thread counts and threads per core in the title.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
};

use crate::types::{round2, MetricsSnapshot};
use crate::ui::util::gauge_pct;

pub fn draw_threads(f: &mut ratatui::Frame<'_>, area: Rect, m: Option<&MetricsSnapshot>) {
    let title = match m {
        Some(mm) => format!(
            "Threads — active {}/{} | {:.2} per core",
            mm.threads.active_threads, mm.threads.total_threads, mm.threads.threads_per_core
        ),
        None => "Threads".into(),
    };
    let pct = m.map(|mm| mm.threads.active_percent()).unwrap_or(0.0);

    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(Color::Yellow))
        .percent(gauge_pct(pct))
        .label(format!("{:.2}%", round2(pct)));
    f.render_widget(g, area);
}
