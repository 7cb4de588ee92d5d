//! Entry point for sockmon_agent: pick the port, start the sampler, serve `/ws`.

use std::{env, net::SocketAddr, time::Duration};

use sockmon_agent::{parse_port, sampler::spawn_sampler, state::AppState, ws::router, DEFAULT_PORT};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let default_port = env::var("SOCKMON_AGENT_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let port = parse_port(env::args(), default_port);
    let interval_ms: u64 = env::var("SOCKMON_AGENT_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1000);

    let state = AppState::new(Duration::from_millis(interval_ms));
    let _sampler = spawn_sampler(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, interval_ms, "agent listening on ws://{addr}/ws");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
