//! Periodic re-query with an out-of-band "data changed" trigger.
//!
//! Dashboard widgets poll their query on a fixed cadence and re-run it at once
//! when new documents are indexed. A failed refresh keeps the previous result;
//! only successful bodies are published.

use crate::client::SearchClient;
use crate::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle to a running refresh task.
///
/// Dropping the handle stops the task.
pub struct RefreshHandle {
    latest: watch::Receiver<Option<serde_json::Value>>,
    trigger: Arc<Notify>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Most recent successful result, `None` until the first one lands.
    pub fn latest(&self) -> Option<serde_json::Value> {
        self.latest.borrow().clone()
    }

    /// Re-run the query now instead of waiting for the next tick.
    ///
    /// Several calls before the task wakes up collapse into one refresh.
    pub fn notify_data_changed(&self) {
        self.trigger.notify_one();
    }

    /// Wait until a new result is published. Returns `false` once the task has stopped.
    pub async fn changed(&mut self) -> bool {
        self.latest.changed().await.is_ok()
    }

    /// Independent receiver for other consumers of the same results.
    pub fn subscribe(&self) -> watch::Receiver<Option<serde_json::Value>> {
        self.latest.clone()
    }

    /// Stop the task, cancelling any search in flight, and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "refresh task ended abnormally");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Run `query` now, every `every`, and whenever [`RefreshHandle::notify_data_changed`] is called.
///
/// Must be called from within a tokio runtime.
pub fn spawn_refresh(
    client: Arc<SearchClient>,
    query: serde_json::Value,
    every: Duration,
) -> RefreshHandle {
    let (tx, rx) = watch::channel(None);
    let trigger = Arc::new(Notify::new());
    let shutdown = CancellationToken::new();

    let task = tokio::spawn(refresh_loop(
        client,
        query,
        every,
        tx,
        Arc::clone(&trigger),
        shutdown.clone(),
    ));

    RefreshHandle {
        latest: rx,
        trigger,
        shutdown,
        task: Some(task),
    }
}

async fn refresh_loop(
    client: Arc<SearchClient>,
    query: serde_json::Value,
    every: Duration,
    tx: watch::Sender<Option<serde_json::Value>>,
    trigger: Arc<Notify>,
    shutdown: CancellationToken,
) {
    // interval panics on a zero period
    let mut ticker = interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = trigger.notified() => {
                debug!("refresh triggered by data change");
                // the poll cadence restarts from the out-of-band refresh
                ticker.reset();
            }
            _ = ticker.tick() => {}
        }

        match client.search_with_cancel(&query, &shutdown).await {
            Ok(body) => {
                tx.send_replace(Some(body));
            }
            Err(Error::Cancelled { .. }) => break,
            Err(e) => {
                // keep serving the stale result
                warn!(error = %e, "refresh failed, keeping previous result");
            }
        }
    }
    debug!("refresh task stopped");
}
