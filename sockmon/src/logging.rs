//! tracing setup. The TUI owns the terminal, so it only logs when a file is given.

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

use crate::config::Mode;

pub const ENV_LOG: &str = "SOCKMON_LOG";

pub fn init_logging(mode: Mode, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));

    let res = match (log_file, mode) {
        (Some(path), _) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        (None, Mode::Plain) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        (None, Mode::Tui) => return Ok(()),
    };
    res.map_err(|e| anyhow!("failed to install logger: {e}"))
}
