//! Entry point for the sockmon client. Parses args, starts the connection and runs a display.

use std::env;

use sockmon::app::{run_plain, App};
use sockmon::config::{parse_args, ClientConfig, CliError, Mode};
use sockmon::logging::init_logging;
use sockmon::store::SnapshotStore;
use sockmon::ws::{ConnectionManager, ReconnectPolicy, WsConnector};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(CliError::Help(msg)) => {
            println!("{msg}");
            return Ok(());
        }
        Err(CliError::Invalid(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };
    let cfg = ClientConfig::resolve(parsed, |k| env::var(k).ok())?;

    if cfg.dry_run {
        println!("{cfg}");
        return Ok(());
    }

    init_logging(cfg.mode, cfg.log_file.as_deref())?;
    info!(url = %cfg.url, reconnect_ms = cfg.reconnect_delay.as_millis() as u64, "starting");

    let store = SnapshotStore::new();
    let connector = WsConnector::new(cfg.url.as_str(), cfg.tls_ca.clone());
    let handle = ConnectionManager::new(
        connector,
        store.clone(),
        ReconnectPolicy::new(cfg.reconnect_delay),
    )
    .start();

    let res = match cfg.mode {
        Mode::Tui => {
            let mut app = App::new(store.subscribe(), handle.subscribe_state());
            app.run().await
        }
        Mode::Plain => {
            tokio::select! {
                res = run_plain(store.subscribe()) => res,
                _ = tokio::signal::ctrl_c() => Ok(()),
            }
        }
    };

    handle.stop().await;
    res
}
