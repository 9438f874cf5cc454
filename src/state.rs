use crate::error::AppError;
use crate::service::AreaSnapshot;
use tokio::sync::watch;

#[derive(Debug)]
pub struct AppState {
    snapshot: Option<AreaSnapshot>,
    snapshot_tx: watch::Sender<Option<AreaSnapshot>>,
}

impl AppState {
    pub fn new() -> Self {
        let (snapshot_tx, _snapshot_rx) = watch::channel(None);
        Self {
            snapshot: None,
            snapshot_tx,
        }
    }

    /// Latest campus snapshot, if a refresh has completed.
    pub fn snapshot(&self) -> Option<&AreaSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<AreaSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn set_snapshot(&mut self, snapshot: AreaSnapshot) -> Result<(), AppError> {
        self.snapshot = Some(snapshot.clone());
        self.snapshot_tx
            .send(Some(snapshot))
            .map_err(|_| AppError::WatchSend)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
