//! Progress tracker: publishes live batch counters through a
//! `tokio::sync::watch` channel so any observer can render
//! `completed / total` while a batch runs.

use serde::Serialize;
use tokio::sync::watch;

use crate::models::transfer::{BatchKind, TransferBatch};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub kind: Option<BatchKind>,
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub running: bool,
}

impl BatchProgress {
    fn from_batch(batch: &TransferBatch, running: bool) -> Self {
        Self {
            kind: Some(batch.kind),
            completed: batch.completed_count,
            total: batch.total_count,
            succeeded: batch.succeeded_count,
            running,
        }
    }

    /// Completion percentage. An empty batch counts as done.
    pub fn percent(&self) -> f64 {
        if self.total > 0 {
            (self.completed as f64 / self.total as f64) * 100.0
        } else {
            100.0
        }
    }
}

pub struct ProgressTracker {
    tx: watch::Sender<BatchProgress>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BatchProgress::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> BatchProgress {
        self.tx.borrow().clone()
    }

    pub fn begin(&self, batch: &TransferBatch) {
        self.tx.send_replace(BatchProgress::from_batch(batch, true));
    }

    /// Publish counters after a job resolved.
    pub fn update(&self, batch: &TransferBatch) {
        self.tx.send_replace(BatchProgress::from_batch(batch, true));
    }

    pub fn finish(&self, batch: &TransferBatch) {
        self.tx.send_replace(BatchProgress::from_batch(batch, false));
    }
}
