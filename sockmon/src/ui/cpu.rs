//! CPU usage gauge.

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Gauge},
};

use crate::types::{round2, MetricsSnapshot};
use crate::ui::util::{gauge_pct, load_color};

pub fn draw_cpu(f: &mut ratatui::Frame<'_>, area: Rect, m: Option<&MetricsSnapshot>) {
    let pct = m.map(|mm| mm.cpu_usage_percent).unwrap_or(0.0);
    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("CPU"))
        .gauge_style(Style::default().fg(load_color(pct)))
        .percent(gauge_pct(pct))
        .label(format!("{:.2}%", round2(pct)));
    f.render_widget(g, area);
}
