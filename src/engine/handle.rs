//! Cloneable control surface for a running `MigrationEngine`.

use crate::domain::{EngineError, MigrationSummary};
use crate::state_machine::EngineSnapshot;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, EngineError>>;

/// Requests sent to the engine task. Each carries its own reply channel.
pub(crate) enum EngineRequest {
    Start(Reply<()>),
    Proceed(Reply<()>),
    Cancel(Reply<CancelOutcome>),
    ConfirmRollback(Reply<()>),
    CancelRollback(Reply<()>),
    Reset(Reply<()>),
    Summary(Reply<MigrationSummary>),
}

impl EngineRequest {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            EngineRequest::Start(_) => "start",
            EngineRequest::Proceed(_) => "proceed",
            EngineRequest::Cancel(_) => "cancel",
            EngineRequest::ConfirmRollback(_) => "confirm_rollback",
            EngineRequest::CancelRollback(_) => "cancel_rollback",
            EngineRequest::Reset(_) => "reset",
            EngineRequest::Summary(_) => "summary",
        }
    }
}

/// What a `cancel()` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Nothing to cancel, or nothing software can still undo.
    NoOp,
    /// Nothing destructive had begun; the engine is back in `NotStarted`.
    Reset,
    /// Destructive work may have committed; the user must confirm a rollback.
    ConfirmationRequested,
}

#[derive(Clone)]
pub struct MigrationHandle {
    requests: mpsc::UnboundedSender<EngineRequest>,
    snapshots: watch::Receiver<EngineSnapshot>,
}

impl MigrationHandle {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<EngineRequest>,
        snapshots: watch::Receiver<EngineSnapshot>,
    ) -> Self {
        Self {
            requests,
            snapshots,
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(build(tx))
            .map_err(|_| EngineError::EngineStopped)?;
        rx.await.map_err(|_| EngineError::EngineStopped)?
    }

    /// Runs the Assessment phase. Resolves once it finished or was cancelled.
    pub async fn start(&self) -> Result<(), EngineError> {
        self.request(EngineRequest::Start).await
    }

    /// Runs the forward pipeline. Resolves once the engine is at rest again.
    pub async fn proceed(&self) -> Result<(), EngineError> {
        self.request(EngineRequest::Proceed).await
    }

    pub async fn cancel(&self) -> Result<CancelOutcome, EngineError> {
        self.request(EngineRequest::Cancel).await
    }

    /// Resolves after the rollback it triggers has finished.
    pub async fn confirm_rollback(&self) -> Result<(), EngineError> {
        self.request(EngineRequest::ConfirmRollback).await
    }

    pub async fn cancel_rollback(&self) -> Result<(), EngineError> {
        self.request(EngineRequest::CancelRollback).await
    }

    /// Returns every engine-owned field to its initial value, abandoning a
    /// running phase.
    pub async fn reset(&self) -> Result<(), EngineError> {
        self.request(EngineRequest::Reset).await
    }

    pub async fn summary(&self) -> Result<MigrationSummary, EngineError> {
        self.request(EngineRequest::Summary).await
    }

    /// Receiver that sees a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshots.borrow().clone()
    }
}
