//! Bridge for progress published by collaborators on their own schedule.
//!
//! Collaborators hold a cloneable `ProgressNotifier`; the engine owns the
//! single `ProgressInbox` and drains it on its control loop, so progress
//! fields are only ever written by the engine itself.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// An inbound progress event from a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressNotification {
    /// Phase-local progress in `[0, 1]`.
    pub progress: f64,
    pub step: String,
}

/// Sending half, handed to collaborators.
#[derive(Debug, Clone)]
pub struct ProgressNotifier {
    inner: mpsc::UnboundedSender<ProgressNotification>,
}

impl ProgressNotifier {
    /// Publishes progress. Dropped silently once the engine has stopped.
    pub fn notify(&self, progress: f64, step: impl Into<String>) {
        let _ = self.inner.send(ProgressNotification {
            progress,
            step: step.into(),
        });
    }
}

/// Receiving half, owned by the engine.
#[derive(Debug)]
pub struct ProgressInbox {
    inner: mpsc::UnboundedReceiver<ProgressNotification>,
}

impl ProgressInbox {
    pub async fn recv(&mut self) -> Option<ProgressNotification> {
        self.inner.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ProgressNotification> {
        self.inner.try_recv().ok()
    }
}

/// Creates a connected notifier/inbox pair.
pub fn progress_channel() -> (ProgressNotifier, ProgressInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressNotifier { inner: tx },
        ProgressInbox { inner: rx },
    )
}
