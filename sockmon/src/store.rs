//! Latest-sample store shared between the connection task and the display.
//!
//! The whole [`StoreState`] is published through a `watch` channel, so a reader
//! always sees a complete value and can await the next change instead of polling.

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::MetricsSnapshot;

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub snapshot: Option<Arc<MetricsSnapshot>>,
    pub error: Option<String>,
}

/// Write side. Cloning shares the same underlying channel.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<StoreState>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StoreState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    pub fn current_snapshot(&self) -> Option<Arc<MetricsSnapshot>> {
        self.tx.borrow().snapshot.clone()
    }

    pub fn connection_error(&self) -> Option<String> {
        self.tx.borrow().error.clone()
    }

    /// Replace the snapshot; the error message is left as it is.
    pub fn set_snapshot(&self, snapshot: MetricsSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.tx.send_modify(|state| state.snapshot = Some(snapshot));
    }

    pub fn set_error(&self, msg: impl Into<String>) {
        let msg = msg.into();
        self.tx.send_if_modified(|state| {
            if state.error.as_deref() == Some(msg.as_str()) {
                return false;
            }
            state.error = Some(msg);
            true
        });
    }

    pub fn clear_error(&self) {
        self.tx.send_if_modified(|state| state.error.take().is_some());
    }

    pub fn subscribe(&self) -> StoreReader {
        StoreReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side handed to display adapters.
#[derive(Debug, Clone)]
pub struct StoreReader {
    rx: watch::Receiver<StoreState>,
}

impl StoreReader {
    /// Current state; marks it as seen so the next `changed` waits for a new write.
    pub fn get(&mut self) -> StoreState {
        self.rx.borrow_and_update().clone()
    }

    /// Resolves on the next write. Returns false once every writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    pub async fn wait_for(&mut self, mut f: impl FnMut(&StoreState) -> bool) -> Option<StoreState> {
        self.rx.wait_for(|s| f(s)).await.ok().map(|s| s.clone())
    }
}
