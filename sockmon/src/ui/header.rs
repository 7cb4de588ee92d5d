//! Top header: connection state, last update time and the error banner.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::store::StoreState;
use crate::ws::ConnectionState;

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, s: &StoreState, conn: ConnectionState) {
    let updated = s
        .snapshot
        .as_ref()
        .map(|m| format!("updated {}", m.timestamp.format("%H:%M:%S")))
        .unwrap_or_else(|| "waiting for data".into());
    let title = format!("sockmon — {conn} | {updated}  (press 'q' to quit)");

    let banner = match s.error.as_deref() {
        Some(msg) => Line::from(Span::styled(
            msg.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::default(),
    };
    let p = Paragraph::new(banner).block(Block::default().title(title).borders(Borders::BOTTOM));
    f.render_widget(p, area);
}
