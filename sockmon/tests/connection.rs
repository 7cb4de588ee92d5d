//! Reconnect loop and store updates, driven by a scripted in-memory transport.
//! Runs on tokio's paused clock so the 3s reconnect delay costs nothing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use sockmon::error::ClientError;
use sockmon::store::SnapshotStore;
use sockmon::ws::{
    ConnectionHandle, ConnectionManager, ConnectionState, Connector, Incoming, ReconnectPolicy,
    Session, MSG_CONNECTION_LOST, MSG_PAYLOAD_ERROR, MSG_TRANSPORT_ERROR,
};
use tokio::sync::mpsc;
use tokio::time::{advance, sleep, Instant};

const DELAY: Duration = Duration::from_millis(3000);

const SAMPLE: &str = r#"{"cpu_usage":55,"total_memory":8589934592,"used_memory":4294967296,
"disk_usage":[{"nome":"C","uso":40,"total":107374182400,"disponivel":64424509440}],
"thread_metrics":{"total_threads":16,"active_threads":4,"thread_per_core":0.25}}"#;

type Feed = mpsc::UnboundedSender<Result<Incoming, ClientError>>;

struct MockSession {
    rx: mpsc::UnboundedReceiver<Result<Incoming, ClientError>>,
    closed: Arc<AtomicUsize>,
}

impl Session for MockSession {
    fn recv(&mut self) -> BoxFuture<'_, Option<Result<Incoming, ClientError>>> {
        Box::pin(self.rx.recv())
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {})
    }
}

/// Each connect pops the next scripted outcome; an empty script refuses.
#[derive(Clone, Default)]
struct MockConnector {
    script: Arc<Mutex<VecDeque<Option<MockSession>>>>,
    attempts: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockConnector {
    fn accept(&self) -> Feed {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = MockSession {
            rx,
            closed: self.closed.clone(),
        };
        self.script.lock().unwrap().push_back(Some(session));
        tx
    }

    fn refuse(&self) {
        self.script.lock().unwrap().push_back(None);
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>, ClientError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().flatten();
        Box::pin(async move {
            match next {
                Some(s) => Ok(Box::new(s) as Box<dyn Session>),
                None => Err(ClientError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "refused",
                ))),
            }
        })
    }
}

/// A handshake that never completes.
#[derive(Clone, Default)]
struct StalledConnector {
    attempts: Arc<AtomicUsize>,
}

impl Connector for StalledConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Session>, ClientError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(futures::future::pending::<Result<Box<dyn Session>, ClientError>>())
    }
}

fn start(connector: &MockConnector, store: &SnapshotStore) -> ConnectionHandle {
    ConnectionManager::new(connector.clone(), store.clone(), ReconnectPolicy::new(DELAY)).start()
}

async fn wait_state(handle: &ConnectionHandle, want: ConnectionState) {
    let mut rx = handle.subscribe_state();
    rx.wait_for(|s| *s == want).await.expect("state channel closed");
}

fn text(s: &str) -> Result<Incoming, ClientError> {
    Ok(Incoming::Text(s.to_string()))
}

#[tokio::test(start_paused = true)]
async fn message_updates_store_and_open_clears_error() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    store.set_error("stale");
    let feed = conn.accept();
    let handle = start(&conn, &store);

    wait_state(&handle, ConnectionState::Open).await;
    assert!(store.connection_error().is_none());

    let mut reader = store.subscribe();
    feed.send(text(SAMPLE)).unwrap();
    let state = reader.wait_for(|s| s.snapshot.is_some()).await.unwrap();
    let snap = state.snapshot.unwrap();
    assert_eq!(snap.cpu_usage_percent, 55.0);
    assert_eq!(snap.total_memory_gb, 8.0);
    assert_eq!(snap.used_memory_gb, 4.0);
    assert_eq!(snap.disk_volumes[0].total_gb, 100.0);
    assert_eq!(snap.disk_volumes[0].available_gb, 60.0);
    assert_eq!(snap.threads.active_threads, 4);
    assert_eq!(snap.threads.total_threads, 16);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn unparsable_message_keeps_last_snapshot() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    let feed = conn.accept();
    let handle = start(&conn, &store);
    let mut reader = store.subscribe();

    feed.send(text(SAMPLE)).unwrap();
    reader.wait_for(|s| s.snapshot.is_some()).await.unwrap();
    let before = store.current_snapshot().unwrap();

    feed.send(text("definitely not json")).unwrap();
    reader.wait_for(|s| s.error.is_some()).await.unwrap();
    assert_eq!(store.connection_error().as_deref(), Some(MSG_PAYLOAD_ERROR));
    assert!(Arc::ptr_eq(&before, &store.current_snapshot().unwrap()));

    // a JSON array is decodable but still not a payload
    store.clear_error();
    feed.send(text("[1,2,3]")).unwrap();
    reader.wait_for(|s| s.error.is_some()).await.unwrap();
    assert!(Arc::ptr_eq(&before, &store.current_snapshot().unwrap()));
    assert_eq!(handle.state(), ConnectionState::Open);
    assert_eq!(conn.attempts(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn binary_frames_are_decoded_as_text() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    let feed = conn.accept();
    let handle = start(&conn, &store);
    let mut reader = store.subscribe();

    feed.send(Ok(Incoming::Binary(SAMPLE.as_bytes().to_vec()))).unwrap();
    reader.wait_for(|s| s.snapshot.is_some()).await.unwrap();

    feed.send(Ok(Incoming::Binary(vec![0xff, 0xfe, 0x00]))).unwrap();
    reader.wait_for(|s| s.error.is_some()).await.unwrap();
    assert_eq!(store.connection_error().as_deref(), Some(MSG_PAYLOAD_ERROR));

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn transport_failure_schedules_exactly_one_reconnect() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    let feed = conn.accept();
    let _second = conn.accept();
    let handle = start(&conn, &store);
    let mut reader = store.subscribe();

    feed.send(text(SAMPLE)).unwrap();
    reader.wait_for(|s| s.snapshot.is_some()).await.unwrap();
    let before = store.current_snapshot().unwrap();

    feed.send(Err(ClientError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "reset",
    ))))
    .unwrap();
    wait_state(&handle, ConnectionState::Failed).await;
    let failed_at = Instant::now();
    assert_eq!(store.connection_error().as_deref(), Some(MSG_TRANSPORT_ERROR));
    assert!(Arc::ptr_eq(&before, &store.current_snapshot().unwrap()));
    assert_eq!(conn.attempts(), 1);

    // nothing happens before the delay has passed
    advance(DELAY - Duration::from_millis(1)).await;
    assert_eq!(conn.attempts(), 1);

    wait_state(&handle, ConnectionState::Open).await;
    assert!(failed_at.elapsed() >= DELAY);
    assert_eq!(conn.attempts(), 2);
    assert!(store.connection_error().is_none());

    // the second session stays up: no extra attempts pile up
    sleep(DELAY * 3).await;
    assert_eq!(conn.attempts(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn refused_connections_retry_forever_at_fixed_interval() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    let handle = start(&conn, &store);

    wait_state(&handle, ConnectionState::Failed).await;
    let t0 = Instant::now();
    assert_eq!(store.connection_error().as_deref(), Some(MSG_TRANSPORT_ERROR));

    // sample right between retries
    sleep(DELAY / 2).await;
    for n in 1..=10u64 {
        assert_eq!(conn.attempts() as u64, n, "after {:?}", t0.elapsed());
        sleep(DELAY).await;
    }
    assert!(store.current_snapshot().is_none());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn remote_close_reports_lost_connection_and_reconnects() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    let feed = conn.accept();
    let _next = conn.accept();
    let handle = start(&conn, &store);
    let mut reader = store.subscribe();

    feed.send(text(SAMPLE)).unwrap();
    reader.wait_for(|s| s.snapshot.is_some()).await.unwrap();
    drop(feed);

    wait_state(&handle, ConnectionState::Closed).await;
    assert_eq!(store.connection_error().as_deref(), Some(MSG_CONNECTION_LOST));
    assert!(store.current_snapshot().is_some());

    wait_state(&handle, ConnectionState::Open).await;
    assert_eq!(conn.attempts(), 2);
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_while_open_prevents_any_reconnect() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    let _feed = conn.accept();
    let handle = start(&conn, &store);
    let mut state = handle.subscribe_state();

    wait_state(&handle, ConnectionState::Open).await;
    handle.stop().await;
    assert_eq!(*state.borrow_and_update(), ConnectionState::Stopped);
    assert_eq!(conn.closed.load(Ordering::SeqCst), 1);

    sleep(DELAY + Duration::from_millis(1)).await;
    sleep(DELAY + Duration::from_millis(1)).await;
    assert_eq!(conn.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_during_backoff_cancels_pending_attempt() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    conn.refuse();
    let handle = start(&conn, &store);

    wait_state(&handle, ConnectionState::Failed).await;
    handle.stop().await;

    sleep(DELAY * 2 + Duration::from_millis(1)).await;
    assert_eq!(conn.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_connection() {
    let conn = MockConnector::default();
    let store = SnapshotStore::new();
    let handle = start(&conn, &store);
    let mut state = handle.subscribe_state();

    wait_state(&handle, ConnectionState::Failed).await;
    drop(handle);

    state
        .wait_for(|s| *s == ConnectionState::Stopped)
        .await
        .ok();
    sleep(DELAY * 3).await;
    assert_eq!(conn.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_while_connecting_is_terminal() {
    let conn = StalledConnector::default();
    let store = SnapshotStore::new();
    let handle =
        ConnectionManager::new(conn.clone(), store.clone(), ReconnectPolicy::new(DELAY)).start();
    let mut state = handle.subscribe_state();

    sleep(DELAY).await;
    assert_eq!(handle.state(), ConnectionState::Connecting);
    assert_eq!(handle.attempts(), 1);

    handle.stop().await;
    assert_eq!(*state.borrow_and_update(), ConnectionState::Stopped);
    assert!(store.connection_error().is_none());

    advance(DELAY * 2 + Duration::from_millis(1)).await;
    assert_eq!(conn.attempts.load(Ordering::SeqCst), 1);
}
