//! Phase execution and the rollback policy.
//!
//! Phases run strictly one at a time. While a phase future is polled the
//! engine keeps serving requests and notifications, so a cancel or a
//! summary never waits for a slow collaborator.

use super::MigrationEngine;
use crate::domain::{format_duration, LogLevel, MigrationExecutionError, MigrationPhase};
use crate::phases::{run_phase_with_timeout, PhaseContext, PhaseReporter, PhaseResult, PhaseUpdate};
use crate::state_machine::StateCommand;

/// How a driven phase ended.
pub(super) enum PhaseExit {
    Finished(PhaseResult),
    /// A cancel or reset dropped the phase and reset the engine.
    Aborted,
}

impl MigrationEngine {
    /// Runs a single phase to its completion signal.
    pub(super) async fn drive_phase(&mut self, phase: MigrationPhase) -> PhaseExit {
        if !self.apply(StateCommand::EnterPhase(phase)) {
            return PhaseExit::Finished(Err(MigrationExecutionError::for_phase(
                phase,
                "engine was not in a state to run this phase",
            )));
        }

        let (reporter, mut updates) = PhaseReporter::channel();
        let ctx = PhaseContext {
            services: self.services.clone(),
            reporter,
        };
        let timeout = self.config.timeouts.timeout_for(phase);
        let phase_future = run_phase_with_timeout(phase, timeout, ctx);
        tokio::pin!(phase_future);

        self.phase_in_flight = Some(phase);
        self.phase_aborted = false;
        tracing::debug!(%phase, ?timeout, "phase started");

        let result = loop {
            tokio::select! {
                biased;
                Some(update) = updates.recv() => self.handle_update(update),
                notification = self.inbox.recv(), if !self.inbox_closed => match notification {
                    Some(notification) => self.handle_notification(notification),
                    None => self.inbox_closed = true,
                },
                request = self.requests.recv(), if !self.requests_closed => match request {
                    Some(request) => self.handle_request_mid_phase(request),
                    None => self.requests_closed = true,
                },
                result = &mut phase_future => break Some(result),
            }
            if self.phase_aborted {
                break None;
            }
        };

        let Some(result) = result else {
            self.phase_in_flight = None;
            self.phase_aborted = false;
            tracing::debug!(%phase, "phase dropped by cancel");
            return PhaseExit::Aborted;
        };

        // Callbacks sent in the same poll that completed the phase. The
        // runner's own closing report goes last.
        while let Some(notification) = self.inbox.try_recv() {
            self.handle_notification(notification);
        }
        while let Ok(update) = updates.try_recv() {
            self.handle_update(update);
        }
        self.phase_in_flight = None;

        tracing::debug!(%phase, ok = result.is_ok(), "phase finished");
        PhaseExit::Finished(result)
    }

    fn handle_update(&mut self, update: PhaseUpdate) {
        let command = match update {
            PhaseUpdate::Progress(local) => StateCommand::ReportProgress { local },
            PhaseUpdate::Detail(text) => StateCommand::SetDetail(text),
            PhaseUpdate::Log(level, message) => StateCommand::Log { level, message },
            PhaseUpdate::Assessment(assessment) => StateCommand::RecordAssessment(assessment),
            PhaseUpdate::Validation(summary) => StateCommand::RecordValidation(summary),
        };
        self.apply(command);
    }

    pub(super) async fn run_assessment(&mut self) {
        match self.drive_phase(MigrationPhase::Assessment).await {
            PhaseExit::Aborted => {}
            PhaseExit::Finished(Ok(())) => {
                self.apply(StateCommand::CompletePhase(MigrationPhase::Assessment));
                self.apply(StateCommand::CompleteAssessment);
                let status = match &self.machine.state().assessment {
                    Some(assessment) if assessment.can_migrate => "Ready to migrate",
                    Some(_) => "Migration not possible",
                    None => "Assessment finished without a verdict",
                };
                self.apply(StateCommand::SetStatus(status.into()));
            }
            PhaseExit::Finished(Err(error)) => self.handle_phase_failure(error).await,
        }
    }

    /// Preparation through Completion, stopping at the first failure.
    pub(super) async fn run_pipeline(&mut self) {
        for phase in MigrationPhase::FORWARD_PIPELINE {
            match self.drive_phase(phase).await {
                PhaseExit::Aborted => return,
                PhaseExit::Finished(Ok(())) => {
                    self.apply(StateCommand::CompletePhase(phase));
                    self.log(LogLevel::Info, format!("{phase} phase completed"));
                }
                PhaseExit::Finished(Err(error)) => {
                    self.handle_phase_failure(error).await;
                    return;
                }
            }

            if self.pending_rollback.is_some() {
                self.log(
                    LogLevel::Warning,
                    format!("Stopping after {phase} to roll back as confirmed"),
                );
                self.run_rollback(None).await;
                return;
            }
        }

        let offer_pending = self.machine.state().showing_rollback_confirmation;
        self.apply(StateCommand::CompleteMigration);
        if offer_pending {
            self.log(
                LogLevel::Warning,
                "Rollback offer withdrawn: every phase finished before it was answered",
            );
        }
        let elapsed = self.machine.state().elapsed().unwrap_or_default();
        self.log(
            LogLevel::Info,
            format!("Migration completed successfully in {}", format_duration(elapsed)),
        );
    }

    /// Applies the rollback policy to a failed phase.
    async fn handle_phase_failure(&mut self, error: MigrationExecutionError) {
        let phase = error.phase();
        self.log(LogLevel::Error, format!("{phase} phase failed: {}", error.detail()));

        if error.requires_automatic_rollback() {
            self.log(
                LogLevel::Warning,
                format!("Automatic rollback triggered by {phase} failure"),
            );
            self.run_rollback(Some(error)).await;
            return;
        }

        self.apply(StateCommand::FailPhase { error });
        if self.pending_rollback.is_some() {
            self.run_rollback(None).await;
        }
    }

    /// Restores legacy data. Success resets the engine; failure is terminal.
    pub(super) async fn run_rollback(&mut self, cause: Option<MigrationExecutionError>) {
        let outcome = match self.machine.apply(StateCommand::BeginRollback { cause }) {
            Ok(_) => {
                self.log(LogLevel::Warning, "Rolling back to legacy data");
                self.drive_rollback_phase().await;
                Ok(())
            }
            Err(err) => {
                tracing::error!("rollback not started: {err}");
                Err(err)
            }
        };

        if let Some(reply) = self.pending_rollback.take() {
            self.reply("confirm_rollback", reply, outcome);
        }
    }

    async fn drive_rollback_phase(&mut self) {
        match self.drive_phase(MigrationPhase::Rollback).await {
            PhaseExit::Finished(Ok(())) => {
                self.apply(StateCommand::CompletePhase(MigrationPhase::Rollback));
                self.log(LogLevel::Info, "Rollback completed, legacy data restored");
                tracing::info!("rollback succeeded, resetting engine");
                self.reset();
            }
            PhaseExit::Finished(Err(error)) => {
                self.log(
                    LogLevel::Error,
                    format!(
                        "Rollback failed: {}. Manual intervention required",
                        error.detail()
                    ),
                );
                self.apply(StateCommand::FailPhase { error });
            }
            PhaseExit::Aborted => {}
        }
    }
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
