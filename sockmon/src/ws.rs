//! WebSocket client: connects to the agent, feeds every frame through the
//! normalizer into the [`SnapshotStore`], and reconnects on a fixed interval
//! for as long as the handle is alive.

use std::{
    fmt,
    fs::File,
    io::BufReader,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::future::BoxFuture;
use futures_util::StreamExt;
use tokio::{net::TcpStream, sync::watch, task::JoinHandle, time::sleep};
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, Connector as TlsConnector,
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, trace, warn};

use crate::error::{ClientError, PayloadError};
use crate::normalize::parse_message;
use crate::store::SnapshotStore;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

// Status lines shown to the user
pub const MSG_PAYLOAD_ERROR: &str = "Error processing data from server";
pub const MSG_TRANSPORT_ERROR: &str = "Connection error. Reconnecting...";
pub const MSG_CONNECTION_LOST: &str = "Connection lost. Reconnecting...";

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// A data frame received from the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text(String),
    Binary(Vec<u8>),
}

/// One live connection. `recv` yields `None` once the peer has closed.
pub trait Session: Send {
    fn recv(&mut self) -> BoxFuture<'_, Option<Result<Incoming, ClientError>>>;
    fn close(&mut self) -> BoxFuture<'_, ()>;
}

/// Opens sessions. The reconnect loop calls this once per attempt.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>, ClientError>>;
}

// ---------- tungstenite transport ----------

/// Connect to the agent and return the WS stream. `tls_ca` is a PEM bundle
/// trusted for `wss://` URLs.
pub async fn connect(url: &str, tls_ca: Option<&str>) -> Result<WsStream, ClientError> {
    let connector = match tls_ca {
        Some(path) => Some(TlsConnector::Rustls(Arc::new(tls_config(path)?))),
        None => None,
    };
    let (ws, _) = connect_async_tls_with_config(url, None, false, connector).await?;
    Ok(ws)
}

fn tls_config(ca_path: &str) -> Result<rustls::ClientConfig, ClientError> {
    let roots = load_root_store(ca_path)?;
    Ok(rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth())
}

pub fn load_root_store(ca_path: &str) -> Result<rustls::RootCertStore, ClientError> {
    let mut reader = BufReader::new(File::open(ca_path)?);
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots
            .add(cert?)
            .map_err(|e| ClientError::Tls(format!("{ca_path}: {e}")))?;
    }
    if roots.is_empty() {
        return Err(ClientError::Tls(format!("no certificates found in {ca_path}")));
    }
    Ok(roots)
}

pub struct WsSession(WsStream);

impl Session for WsSession {
    fn recv(&mut self) -> BoxFuture<'_, Option<Result<Incoming, ClientError>>> {
        Box::pin(async move {
            loop {
                match self.0.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(Incoming::Text(text))),
                    Ok(Message::Binary(bytes)) => return Some(Ok(Incoming::Binary(bytes))),
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "close frame from agent");
                        return None;
                    }
                    // pings are answered by tungstenite itself
                    Ok(_) => continue,
                    Err(e) => return Some(Err(e.into())),
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Err(e) = self.0.close(None).await {
                debug!(error = %e, "close handshake failed");
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    tls_ca: Option<String>,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, tls_ca: Option<String>) -> Self {
        Self {
            url: url.into(),
            tls_ca,
        }
    }
}

impl Connector for WsConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>, ClientError>> {
        Box::pin(async move {
            let ws = connect(&self.url, self.tls_ca.as_deref()).await?;
            Ok(Box::new(WsSession(ws)) as Box<dyn Session>)
        })
    }
}

// ---------- lifecycle ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    /// Transport error; a reconnect is pending.
    Failed,
    /// Remote close; a reconnect is pending.
    Closed,
    /// Stopped locally. Terminal.
    Stopped,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closing => "closing",
            ConnectionState::Failed => "error",
            ConnectionState::Closed => "disconnected",
            ConnectionState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Fixed-interval retry with no attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

enum SessionEnd {
    Stopped,
    Closed,
    Failed(ClientError),
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    store: SnapshotStore,
    policy: ReconnectPolicy,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, store: SnapshotStore, policy: ReconnectPolicy) -> Self {
        Self {
            connector,
            store,
            policy,
        }
    }

    /// Spawn the connection task. Consumes the manager, so there is only ever
    /// one live connection per manager.
    pub fn start(self) -> ConnectionHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let attempts = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(self.run(shutdown_rx, state_tx, attempts.clone()));
        ConnectionHandle {
            shutdown: shutdown_tx,
            state: state_rx,
            attempts,
            task,
        }
    }

    async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
        state: watch::Sender<ConnectionState>,
        attempts: Arc<AtomicU64>,
    ) {
        loop {
            state.send_replace(ConnectionState::Connecting);
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(attempt, "connecting");

            let connected = tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                res = self.connector.connect() => res,
            };

            match connected {
                Ok(mut session) => {
                    info!(attempt, "connected");
                    self.store.clear_error();
                    state.send_replace(ConnectionState::Open);

                    match self.pump(session.as_mut(), &mut shutdown).await {
                        SessionEnd::Stopped => {
                            state.send_replace(ConnectionState::Closing);
                            let _ = tokio::time::timeout(CLOSE_TIMEOUT, session.close()).await;
                            break;
                        }
                        SessionEnd::Closed => {
                            warn!("connection closed by agent");
                            self.store.set_error(MSG_CONNECTION_LOST);
                            state.send_replace(ConnectionState::Closed);
                        }
                        SessionEnd::Failed(e) => {
                            warn!(error = %e, "connection dropped");
                            self.store.set_error(MSG_TRANSPORT_ERROR);
                            state.send_replace(ConnectionState::Failed);
                        }
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "connect failed");
                    self.store.set_error(MSG_TRANSPORT_ERROR);
                    state.send_replace(ConnectionState::Failed);
                }
            }

            debug!(delay_ms = self.policy.delay.as_millis() as u64, "reconnect scheduled");
            tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                _ = sleep(self.policy.delay) => {}
            }
        }
        info!("connection stopped");
        state.send_replace(ConnectionState::Stopped);
    }

    // Messages are handled one at a time, in arrival order.
    async fn pump(
        &self,
        session: &mut dyn Session,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SessionEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = stop_requested(shutdown) => return SessionEnd::Stopped,
                msg = session.recv() => msg,
            };
            match next {
                Some(Ok(msg)) => self.handle_message(msg),
                Some(Err(e)) => return SessionEnd::Failed(e),
                None => return SessionEnd::Closed,
            }
        }
    }

    fn handle_message(&self, msg: Incoming) {
        let parsed = match msg {
            Incoming::Text(text) => parse_message(&text),
            Incoming::Binary(bytes) => String::from_utf8(bytes)
                .map_err(|_| PayloadError::Binary)
                .and_then(|text| parse_message(&text)),
        };
        match parsed {
            Ok(snapshot) => {
                trace!(cpu = snapshot.cpu_usage_percent, "snapshot");
                self.store.set_snapshot(snapshot);
            }
            Err(e) => {
                // keep the last good snapshot on screen
                warn!(error = %e, "discarding payload");
                self.store.set_error(MSG_PAYLOAD_ERROR);
            }
        }
    }
}

// Resolves once stop was requested or the handle was dropped.
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Owner of a running connection. Dropping it also stops the connection, but
/// only [`ConnectionHandle::stop`] waits for the task to finish.
pub struct ConnectionHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<ConnectionState>,
    attempts: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Connection attempts made so far, including the first.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub async fn stop(self) {
        let ConnectionHandle { shutdown, task, .. } = self;
        // fails only when the task is already gone
        let _ = shutdown.send(true);
        if let Err(e) = task.await {
            warn!(error = %e, "connection task ended abnormally");
        }
    }
}
