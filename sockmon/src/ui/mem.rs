//! Memory gauge.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
};

use crate::types::{round2, MetricsSnapshot};
use crate::ui::util::{gauge_pct, gb};

pub fn draw_mem(f: &mut ratatui::Frame<'_>, area: Rect, m: Option<&MetricsSnapshot>) {
    let (used, total, pct) = if let Some(mm) = m {
        (mm.used_memory_gb, mm.total_memory_gb, mm.memory_used_percent())
    } else {
        (0.0, 0.0, 0.0)
    };

    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Memory"))
        .gauge_style(Style::default().fg(Color::Magenta))
        .percent(gauge_pct(pct))
        .label(format!("{} / {}  ({:.2}%)", gb(used), gb(total), round2(pct)));
    f.render_widget(g, area);
}
