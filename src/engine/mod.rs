//! The migration engine task.
//!
//! One tokio task owns the state machine. Control requests, phase callbacks
//! and collaborator notifications are all serialized through its loop, so
//! engine-owned state has exactly one writer.
//!
//! - **Handle** (`handle.rs`): cloneable request/reply surface for callers
//! - **Driver** (`driver.rs`): phase execution, forward pipeline, rollback policy

mod driver;
mod handle;

pub use handle::{CancelOutcome, MigrationHandle};

use crate::collaborators::MigrationServices;
use crate::config::MigrationConfig;
use crate::domain::{EngineError, LogLevel, MigrationPhase, MigrationState};
use crate::notifications::{ProgressInbox, ProgressNotification};
use crate::state_machine::{MigrationStateMachine, StateCommand};
use crate::structured_logger::StructuredLogger;
use handle::{EngineRequest, Reply};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct MigrationEngine {
    machine: MigrationStateMachine,
    services: MigrationServices,
    config: MigrationConfig,
    logger: Arc<StructuredLogger>,
    requests: mpsc::UnboundedReceiver<EngineRequest>,
    requests_closed: bool,
    inbox: ProgressInbox,
    inbox_closed: bool,
    /// Phase whose future is currently being polled.
    phase_in_flight: Option<MigrationPhase>,
    /// Set when a cancel or reset dropped the in-flight phase.
    phase_aborted: bool,
    /// Reply for a rollback confirmed while a phase was still running.
    pending_rollback: Option<Reply<()>>,
}

impl MigrationEngine {
    /// Spawns the engine task on the current tokio runtime.
    ///
    /// The task stops once every `MigrationHandle` has been dropped.
    pub fn spawn(
        services: MigrationServices,
        inbox: ProgressInbox,
        config: MigrationConfig,
        logger: Arc<StructuredLogger>,
    ) -> (MigrationHandle, JoinHandle<()>) {
        let (machine, snapshots) = MigrationStateMachine::new(config.log.clone(), logger.clone());
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let engine = Self {
            machine,
            services,
            config,
            logger,
            requests: request_rx,
            requests_closed: false,
            inbox,
            inbox_closed: false,
            phase_in_flight: None,
            phase_aborted: false,
            pending_rollback: None,
        };

        let task = tokio::spawn(engine.run());
        (MigrationHandle::new(request_tx, snapshots), task)
    }

    async fn run(mut self) {
        tracing::debug!(session = self.logger.session_id(), "migration engine started");
        loop {
            tokio::select! {
                biased;
                notification = self.inbox.recv(), if !self.inbox_closed => match notification {
                    Some(notification) => self.handle_notification(notification),
                    None => self.inbox_closed = true,
                },
                request = self.requests.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
            }
        }
        tracing::debug!("migration engine stopped");
    }

    /// Handles a request while no phase is executing.
    async fn handle_request(&mut self, request: EngineRequest) {
        self.logger.log_request(request.name());
        match request {
            EngineRequest::Start(reply) => {
                let result = self.start().await;
                self.reply("start", reply, result);
            }
            EngineRequest::Proceed(reply) => {
                let result = self.proceed().await;
                self.reply("proceed", reply, result);
            }
            EngineRequest::Cancel(reply) => {
                let outcome = self.cancel_at_rest();
                self.reply("cancel", reply, Ok(outcome));
            }
            EngineRequest::ConfirmRollback(reply) => {
                if let Err(err) = self.resolve_rollback(true) {
                    self.reply("confirm_rollback", reply, Err(err));
                    return;
                }
                self.pending_rollback = Some(reply);
                self.run_rollback(None).await;
            }
            EngineRequest::CancelRollback(reply) => {
                let result = self.resolve_rollback(false);
                self.reply("cancel_rollback", reply, result);
            }
            EngineRequest::Reset(reply) => {
                self.reset();
                self.reply("reset", reply, Ok(()));
            }
            EngineRequest::Summary(reply) => {
                let summary = self.machine.summary(&self.config.summary);
                let _ = reply.send(Ok(summary));
            }
        }
    }

    /// Handles a request that arrives while a phase future is being polled.
    ///
    /// Nothing here may await: the phase keeps running between requests.
    fn handle_request_mid_phase(&mut self, request: EngineRequest) {
        self.logger.log_request(request.name());
        match request {
            EngineRequest::Start(reply) => {
                let err = self.ordering_error("start");
                self.log(
                    LogLevel::Error,
                    "start() ignored: migration already in progress or completed",
                );
                self.reply("start", reply, Err(err));
            }
            EngineRequest::Proceed(reply) => {
                let err = self.ordering_error("proceed");
                self.log(LogLevel::Error, format!("proceed() rejected: {err}"));
                self.reply("proceed", reply, Err(err));
            }
            EngineRequest::Cancel(reply) => {
                let outcome = self.cancel_mid_phase();
                self.reply("cancel", reply, Ok(outcome));
            }
            EngineRequest::ConfirmRollback(reply) => match self.resolve_rollback(true) {
                Ok(()) => {
                    self.log(
                        LogLevel::Warning,
                        "Rollback confirmed; it will start once the current phase finishes",
                    );
                    self.pending_rollback = Some(reply);
                }
                Err(err) => self.reply("confirm_rollback", reply, Err(err)),
            },
            EngineRequest::CancelRollback(reply) => {
                let result = self.resolve_rollback(false);
                self.reply("cancel_rollback", reply, result);
            }
            EngineRequest::Reset(reply) => {
                self.reset_mid_phase();
                self.reply("reset", reply, Ok(()));
            }
            EngineRequest::Summary(reply) => {
                let summary = self.machine.summary(&self.config.summary);
                let _ = reply.send(Ok(summary));
            }
        }
    }

    async fn start(&mut self) -> Result<(), EngineError> {
        if let Err(err) = self.machine.apply(StateCommand::BeginAssessment) {
            self.log(
                LogLevel::Error,
                "start() ignored: migration already in progress or completed",
            );
            return Err(err);
        }
        self.log(LogLevel::Info, "Starting migration assessment");
        self.run_assessment().await;
        Ok(())
    }

    async fn proceed(&mut self) -> Result<(), EngineError> {
        if let Err(err) = self.machine.apply(StateCommand::BeginExecution) {
            self.log(LogLevel::Error, format!("proceed() rejected: {err}"));
            return Err(err);
        }
        self.log(LogLevel::Info, "Migration confirmed, starting execution");
        self.run_pipeline().await;
        Ok(())
    }

    fn cancel_at_rest(&mut self) -> CancelOutcome {
        let error = self.machine.state().migration_error.clone();
        match self.machine.state().migration_state {
            MigrationState::NotStarted | MigrationState::Completed => CancelOutcome::NoOp,
            MigrationState::AssessmentCompleted => {
                self.log(LogLevel::Info, "Migration cancelled after assessment");
                self.reset();
                CancelOutcome::Reset
            }
            MigrationState::Failed => match error {
                Some(error) if error.is_terminal() => {
                    self.log(
                        LogLevel::Error,
                        "Rollback already failed; manual intervention required",
                    );
                    CancelOutcome::NoOp
                }
                Some(error) if error.phase().requires_rollback_confirmation() => {
                    self.request_rollback_confirmation()
                }
                _ => {
                    self.reset();
                    CancelOutcome::Reset
                }
            },
            // Only reachable mid-phase; handled by `cancel_mid_phase`.
            MigrationState::InProgress | MigrationState::RollingBack => CancelOutcome::NoOp,
        }
    }

    fn cancel_mid_phase(&mut self) -> CancelOutcome {
        match (self.machine.state().migration_state, self.phase_in_flight) {
            (MigrationState::InProgress, Some(phase))
                if !phase.requires_rollback_confirmation() =>
            {
                self.log(
                    LogLevel::Info,
                    format!("Migration cancelled during {phase}; nothing was changed"),
                );
                self.phase_aborted = true;
                self.reset();
                CancelOutcome::Reset
            }
            (MigrationState::InProgress, Some(_)) => self.request_rollback_confirmation(),
            _ => CancelOutcome::NoOp,
        }
    }

    fn request_rollback_confirmation(&mut self) -> CancelOutcome {
        if self.apply(StateCommand::RequestRollbackConfirmation) {
            self.log(
                LogLevel::Warning,
                "Cancelling now requires rolling back; waiting for confirmation",
            );
            CancelOutcome::ConfirmationRequested
        } else {
            CancelOutcome::NoOp
        }
    }

    fn resolve_rollback(&mut self, confirmed: bool) -> Result<(), EngineError> {
        self.machine
            .apply(StateCommand::ResolveRollbackConfirmation { confirmed })?;
        if !confirmed {
            self.log(LogLevel::Info, "Rollback declined; continuing as before");
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.apply(StateCommand::Reset);
    }

    /// Drops the in-flight phase without running the rest of the pipeline.
    fn reset_mid_phase(&mut self) {
        let phase = self.phase_in_flight;
        self.log(
            LogLevel::Warning,
            format!(
                "Reset while {} was running; the phase was abandoned",
                phase.map(|p| p.name()).unwrap_or("a phase")
            ),
        );
        if let Some(reply) = self.pending_rollback.take() {
            self.reply("confirm_rollback", reply, Err(EngineError::RollbackAbandoned));
        }
        self.phase_aborted = true;
        self.reset();
    }

    fn handle_notification(&mut self, notification: ProgressNotification) {
        let applied = self.phase_in_flight.is_some()
            && self.apply(StateCommand::ApplyNotification {
                progress: notification.progress,
                step: notification.step.clone(),
            });
        if !applied {
            tracing::debug!(step = %notification.step, "dropping progress notification outside a phase");
        }
        self.logger
            .log_notification(notification.progress, &notification.step, applied);
    }

    fn ordering_error(&self, operation: &'static str) -> EngineError {
        EngineError::InvalidOrdering {
            operation,
            state: self.machine.state().migration_state,
        }
    }

    /// Applies an engine-internal command; rejections are logged, not raised.
    fn apply(&mut self, command: StateCommand) -> bool {
        match self.machine.apply(command) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!("engine command rejected: {err}");
                false
            }
        }
    }

    fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.apply(StateCommand::Log {
            level,
            message: message.into(),
        });
    }

    fn reply<T>(&self, request: &str, reply: Reply<T>, result: Result<T, EngineError>) {
        if let Err(err) = &result {
            self.logger.log_rejection(request, &err.to_string());
        }
        let _ = reply.send(result);
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
