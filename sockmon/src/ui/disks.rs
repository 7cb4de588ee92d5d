//! Disk cards, one per reported volume and labelled by the volume's name.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Gauge},
};

use crate::types::{round2, MetricsSnapshot};
use crate::ui::util::{disk_icon, gauge_pct, gb, load_color, truncate_middle};

pub fn draw_disks(f: &mut ratatui::Frame<'_>, area: Rect, m: Option<&MetricsSnapshot>) {
    f.render_widget(Block::default().borders(Borders::ALL).title("Disks"), area);
    let Some(mm) = m else { return; };

    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if inner.height < 3 { return; }

    let per_disk_h = 3u16;
    let max_cards = (inner.height / per_disk_h).min(mm.disk_volumes.len() as u16) as usize;

    let constraints: Vec<Constraint> = (0..max_cards).map(|_| Constraint::Length(per_disk_h)).collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (d, slot) in mm.disk_volumes.iter().zip(rows.iter()) {
        let name = if d.name.is_empty() { "(unnamed)" } else { d.name.as_str() };
        let title = format!(
            "{} {}   {} / {}  ({:.2}%)",
            disk_icon(name),
            truncate_middle(name, (slot.width.saturating_sub(6)) as usize / 2),
            gb(d.used_gb()),
            gb(d.total_gb),
            round2(d.used_percent)
        );

        let card = Block::default().borders(Borders::ALL).title(title);
        f.render_widget(card, *slot);

        let inner_card = Rect {
            x: slot.x + 1,
            y: slot.y + 1,
            width: slot.width.saturating_sub(2),
            height: slot.height.saturating_sub(2),
        };
        if inner_card.height == 0 { continue; }

        let g = Gauge::default()
            .percent(gauge_pct(d.used_percent))
            .gauge_style(Style::default().fg(load_color(d.used_percent)));

        f.render_widget(g, inner_card);
    }
}
