//! Display adapters: the terminal UI and the plain line printer. Both only read
//! the store; redraws are driven by store and connection-state notifications.

use std::{
    io::{self, Write},
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::{sync::watch, time::sleep};

use crate::store::{StoreReader, StoreState};
use crate::ui::{
    cpu::draw_cpu, disks::draw_disks, header::draw_header, mem::draw_mem, threads::draw_threads,
    util::summary_line,
};
use crate::ws::ConnectionState;

// How often keyboard input is checked while nothing else happens
const INPUT_TICK: Duration = Duration::from_millis(100);

pub struct App {
    reader: StoreReader,
    conn: watch::Receiver<ConnectionState>,
    store_live: bool,
    conn_live: bool,
    should_quit: bool,
}

impl App {
    pub fn new(reader: StoreReader, conn: watch::Receiver<ConnectionState>) -> Self {
        Self {
            reader,
            conn,
            store_live: true,
            conn_live: true,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let res = self.event_loop(&mut terminal).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        let mut dirty = true;
        loop {
            // Input (non-blocking)
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(k) => {
                        if matches!(
                            k.code,
                            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc
                        ) {
                            self.should_quit = true;
                        }
                    }
                    Event::Resize(_, _) => dirty = true,
                    _ => {}
                }
            }
            if self.should_quit {
                break;
            }

            if dirty {
                let state = self.reader.get();
                let conn = *self.conn.borrow_and_update();
                terminal.draw(|f| draw(f, &state, conn))?;
                dirty = false;
            }

            tokio::select! {
                live = self.reader.changed(), if self.store_live => {
                    self.store_live = live;
                    dirty = true;
                }
                res = self.conn.changed(), if self.conn_live => {
                    self.conn_live = res.is_ok();
                    dirty = true;
                }
                _ = sleep(INPUT_TICK) => {}
            }
        }
        Ok(())
    }
}

pub fn draw(f: &mut ratatui::Frame<'_>, s: &StoreState, conn: ConnectionState) {
    let area = f.area();
    let m = s.snapshot.as_deref();

    // Root rows: header + banner, cpu, memory, threads, disks
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
        ])
        .split(area);

    draw_header(f, rows[0], s, conn);
    draw_cpu(f, rows[1], m);
    draw_mem(f, rows[2], m);
    draw_threads(f, rows[3], m);
    draw_disks(f, rows[4], m);
}

/// `--plain`: one summary line per new snapshot on stdout, status changes on stderr.
pub async fn run_plain(mut reader: StoreReader) -> anyhow::Result<()> {
    let mut last_ts = None;
    let mut last_error: Option<String> = None;
    loop {
        let state = reader.get();
        if let Some(m) = state.snapshot.as_deref() {
            if last_ts != Some(m.timestamp) {
                last_ts = Some(m.timestamp);
                let mut out = io::stdout().lock();
                writeln!(out, "{}", summary_line(m))?;
                out.flush()?;
            }
        }
        if state.error != last_error {
            match state.error.as_deref() {
                Some(msg) => eprintln!("{msg}"),
                None if last_error.is_some() => eprintln!("connected"),
                None => {}
            }
            last_error = state.error;
        }
        if !reader.changed().await {
            return Ok(());
        }
    }
}
