//! Serialized persistence writer.
//!
//! One background task drains a queue of writes in submission order, so the
//! last `update` call always wins in storage. Failures are logged and counted;
//! they never reach the caller.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ConsentError;
use crate::storage::KeyValueStore;

enum WriteCommand {
    Persist { key: String, value: String },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Counters describing persistence activity.
#[derive(Debug, Default)]
pub struct WriterStats {
    completed: AtomicU64,
    failed: AtomicU64,
}

impl WriterStats {
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

pub(crate) struct PersistenceWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
    stats: Arc<WriterStats>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceWriter {
    /// Spawn the writer task on the current tokio runtime.
    pub(crate) fn spawn(storage: Arc<dyn KeyValueStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(WriterStats::default());
        let handle = tokio::spawn(run(storage, rx, Arc::clone(&stats)));

        Self {
            tx,
            stats,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub(crate) fn stats(&self) -> &WriterStats {
        &self.stats
    }

    /// Queue a write. Returns immediately.
    pub(crate) fn enqueue(&self, key: &str, value: String) -> Result<(), ConsentError> {
        self.tx
            .send(WriteCommand::Persist {
                key: key.to_string(),
                value,
            })
            .map_err(|_| ConsentError::WriterClosed)
    }

    /// Wait until every write queued before this call has been attempted.
    pub(crate) async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Drain pending writes and stop the task. Idempotent.
    pub(crate) async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriteCommand::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn run(
    storage: Arc<dyn KeyValueStore>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
    stats: Arc<WriterStats>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Persist { key, value } => {
                persist(storage.as_ref(), &stats, key, value).await;
            }
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
            }
            WriteCommand::Shutdown(ack) => {
                rx.close();
                while let Ok(pending) = rx.try_recv() {
                    if let WriteCommand::Persist { key, value } = pending {
                        persist(storage.as_ref(), &stats, key, value).await;
                    }
                }
                debug!("Consent persistence writer stopped");
                let _ = ack.send(());
                break;
            }
        }
    }
}

async fn persist(storage: &dyn KeyValueStore, stats: &WriterStats, key: String, value: String) {
    match storage.set(&key, &value).await {
        Ok(()) => {
            stats.completed.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Persisted consent state");
        }
        Err(source) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            let error = ConsentError::PersistenceWriteFailure { key, source };
            warn!(error = %error, "Consent write failed; in-memory value kept");
        }
    }
}
