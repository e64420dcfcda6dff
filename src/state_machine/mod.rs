//! Centralized state machine for migration state management.
//!
//! This module provides the ONLY place where engine state changes.
//! The state machine owns the state, validates commands, emits events,
//! and broadcasts snapshots to subscribers via a watch channel.

mod commands;
mod events;
mod snapshot;
mod state;

pub use commands::StateCommand;
pub use events::StateEvent;
pub use snapshot::EngineSnapshot;
pub use state::EngineState;

use crate::config::{LogConfig, SummaryConfig};
use crate::domain::{
    EngineError, LogLevel, MigrationPhase, MigrationState, MigrationSummary,
};
use crate::structured_logger::StructuredLogger;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

/// The ONLY place state transitions happen.
/// Owns the state, validates commands, emits events, broadcasts snapshots.
pub struct MigrationStateMachine {
    state: EngineState,
    log_config: LogConfig,
    snapshot_tx: watch::Sender<EngineSnapshot>,
    logger: Arc<StructuredLogger>,
    seq: u64,
}

impl MigrationStateMachine {
    /// Creates a state machine in `NotStarted`.
    ///
    /// Returns the machine and a watch receiver for snapshots.
    pub fn new(
        log_config: LogConfig,
        logger: Arc<StructuredLogger>,
    ) -> (Self, watch::Receiver<EngineSnapshot>) {
        let state = EngineState::new(&log_config);
        let (snapshot_tx, snapshot_rx) = watch::channel(EngineSnapshot::from(&state));

        let machine = Self {
            state,
            log_config,
            snapshot_tx,
            logger,
            seq: 0,
        };

        (machine, snapshot_rx)
    }

    /// All mutations go through this single method.
    /// Returns events for logging; broadcasts snapshot automatically.
    ///
    /// A rejected command leaves the state untouched.
    pub fn apply(&mut self, command: StateCommand) -> Result<Vec<StateEvent>, EngineError> {
        self.seq += 1;

        self.logger.log_command(self.seq, &command);

        let events = match self.apply_internal(command) {
            Ok(events) => events,
            Err(err) => {
                self.logger.log(
                    "StateMachine",
                    serde_json::json!({
                        "type": "CommandRejected",
                        "machine_seq": self.seq,
                        "reason": err.to_string()
                    }),
                );
                return Err(err);
            }
        };

        for event in &events {
            self.logger.log_event(self.seq, event);
        }

        self.snapshot_tx
            .send_replace(EngineSnapshot::from(&self.state));

        Ok(events)
    }

    /// Read-only access to the current state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn summary(&self, limits: &SummaryConfig) -> MigrationSummary {
        MigrationSummary::capture(&self.state, limits)
    }

    fn apply_internal(&mut self, command: StateCommand) -> Result<Vec<StateEvent>, EngineError> {
        use StateCommand::*;
        use StateEvent::*;

        match command {
            BeginAssessment => {
                let from = self.state.migration_state;
                if !matches!(
                    from,
                    MigrationState::NotStarted | MigrationState::AssessmentCompleted
                ) {
                    return Err(EngineError::InvalidOrdering {
                        operation: "start",
                        state: from,
                    });
                }
                self.transition(MigrationState::InProgress)?;
                self.state.started_at = Some(Utc::now());
                self.state.assessment = None;
                self.state.validation_results.clear();
                self.state.migration_error = None;
                self.state.showing_rollback_confirmation = false;
                Ok(vec![StateChanged {
                    from,
                    to: MigrationState::InProgress,
                }])
            }

            RecordAssessment(assessment) => {
                let can_migrate = assessment.can_migrate;
                if !can_migrate {
                    self.state.detail_message = assessment.reason.clone();
                }
                self.state.assessment = Some(assessment);
                Ok(vec![AssessmentRecorded { can_migrate }])
            }

            CompleteAssessment => {
                if self.state.current_phase != Some(MigrationPhase::Assessment) {
                    return Err(EngineError::NoActivePhase);
                }
                let from = self.state.migration_state;
                self.transition(MigrationState::AssessmentCompleted)?;
                Ok(vec![StateChanged {
                    from,
                    to: MigrationState::AssessmentCompleted,
                }])
            }

            BeginExecution => {
                let from = self.state.migration_state;
                if from != MigrationState::AssessmentCompleted {
                    return Err(EngineError::InvalidOrdering {
                        operation: "proceed",
                        state: from,
                    });
                }
                match &self.state.assessment {
                    Some(assessment) if assessment.can_migrate => {}
                    Some(assessment) => {
                        return Err(EngineError::AssessmentBlocked {
                            reason: assessment.reason.clone(),
                        })
                    }
                    None => {
                        return Err(EngineError::InvalidOrdering {
                            operation: "proceed",
                            state: from,
                        })
                    }
                }
                self.transition(MigrationState::InProgress)?;
                Ok(vec![StateChanged {
                    from,
                    to: MigrationState::InProgress,
                }])
            }

            CompleteMigration => {
                let from = self.state.migration_state;
                self.transition(MigrationState::Completed)?;
                self.state.overall_progress = 1.0;
                self.state.current_step_progress = 1.0;
                self.state.status_message = "Migration complete".to_string();
                self.state.detail_message = "Privacy features are now active".to_string();
                let mut events = vec![StateChanged {
                    from,
                    to: MigrationState::Completed,
                }];
                // Completed offers no rollback; an unanswered offer lapses.
                if self.state.showing_rollback_confirmation {
                    self.state.showing_rollback_confirmation = false;
                    events.push(RollbackConfirmationResolved { confirmed: false });
                }
                Ok(events)
            }

            FailPhase { error } => {
                let from = self.state.migration_state;
                self.transition(MigrationState::Failed)?;
                self.state.status_message = if error.is_terminal() {
                    "Rollback failed".to_string()
                } else {
                    format!("{} failed", error.phase())
                };
                self.state.detail_message = error.detail().to_string();
                self.state.migration_error = Some(error.clone());
                Ok(vec![
                    StateChanged {
                        from,
                        to: MigrationState::Failed,
                    },
                    ErrorRaised { error },
                ])
            }

            BeginRollback { cause } => {
                let from = self.state.migration_state;
                self.transition(MigrationState::RollingBack)?;
                self.state.showing_rollback_confirmation = false;
                let mut events = vec![StateChanged {
                    from,
                    to: MigrationState::RollingBack,
                }];
                if let Some(error) = cause {
                    self.state.migration_error = Some(error.clone());
                    events.push(ErrorRaised { error });
                }
                Ok(events)
            }

            Reset => {
                let from = self.state.migration_state;
                self.state = EngineState::new(&self.log_config);
                self.logger.increment_run_id();
                let mut events = Vec::with_capacity(2);
                if from != MigrationState::NotStarted {
                    events.push(StateChanged {
                        from,
                        to: MigrationState::NotStarted,
                    });
                }
                events.push(EngineReset);
                Ok(events)
            }

            EnterPhase(phase) => {
                let expected = if phase == MigrationPhase::Rollback {
                    MigrationState::RollingBack
                } else {
                    MigrationState::InProgress
                };
                if self.state.migration_state != expected {
                    return Err(EngineError::InvalidOrdering {
                        operation: "enter phase",
                        state: self.state.migration_state,
                    });
                }
                let descriptor = phase.descriptor();
                self.state.current_phase = Some(phase);
                self.state.current_step_progress = 0.0;
                self.state.overall_progress = descriptor.range_start;
                self.state.status_message = descriptor.name.to_string();
                self.state.detail_message = descriptor.description.to_string();
                Ok(vec![PhaseEntered { phase }])
            }

            ReportProgress { local } => self.set_local_progress(local),

            ApplyNotification { progress, step } => {
                let events = self.set_local_progress(progress)?;
                self.state.status_message = step;
                Ok(events)
            }

            CompletePhase(phase) => {
                if self.state.current_phase != Some(phase) {
                    return Err(EngineError::NoActivePhase);
                }
                let range_end = phase.descriptor().range_end;
                if self.state.overall_progress != range_end {
                    tracing::warn!(
                        phase = %phase,
                        progress = self.state.overall_progress,
                        "phase finished without reporting full progress"
                    );
                }
                self.state.current_step_progress = 1.0;
                self.state.overall_progress = range_end;
                Ok(vec![PhaseCompleted {
                    phase,
                    overall_progress: range_end,
                }])
            }

            SetStatus(message) => {
                self.state.status_message = message;
                Ok(vec![])
            }

            SetDetail(message) => {
                self.state.detail_message = message;
                Ok(vec![])
            }

            RecordValidation(summary) => {
                let results = summary.results.len();
                self.state.validation_results = summary.results;
                Ok(vec![ValidationRecorded {
                    overall_status: summary.overall_status,
                    results,
                }])
            }

            RequestRollbackConfirmation => {
                let current = self.state.migration_state;
                if !current.offers_rollback() || current == MigrationState::RollingBack {
                    return Err(EngineError::InvalidOrdering {
                        operation: "request rollback",
                        state: current,
                    });
                }
                if self.state.showing_rollback_confirmation {
                    return Ok(vec![]);
                }
                self.state.showing_rollback_confirmation = true;
                Ok(vec![RollbackConfirmationRequested])
            }

            ResolveRollbackConfirmation { confirmed } => {
                if !self.state.showing_rollback_confirmation {
                    return Err(EngineError::NoRollbackPending);
                }
                self.state.showing_rollback_confirmation = false;
                Ok(vec![RollbackConfirmationResolved { confirmed }])
            }

            Log { level, message } => {
                match level {
                    LogLevel::Info => tracing::info!(phase = ?self.state.current_phase, "{message}"),
                    LogLevel::Warning => {
                        tracing::warn!(phase = ?self.state.current_phase, "{message}")
                    }
                    LogLevel::Error => {
                        tracing::error!(phase = ?self.state.current_phase, "{message}")
                    }
                }
                let dropped = self
                    .state
                    .logs
                    .append(level, self.state.current_phase, message);
                Ok(vec![LogAppended { level, dropped }])
            }
        }
    }

    fn set_local_progress(&mut self, local: f64) -> Result<Vec<StateEvent>, EngineError> {
        let phase = self.state.current_phase.ok_or(EngineError::NoActivePhase)?;
        let local = if local.is_nan() { 0.0 } else { local.clamp(0.0, 1.0) };
        self.state.current_step_progress = local;
        self.state.overall_progress = phase.descriptor().map_local(local);
        Ok(vec![StateEvent::ProgressUpdated {
            overall_progress: self.state.overall_progress,
            step_progress: local,
        }])
    }

    fn transition(&mut self, to: MigrationState) -> Result<(), EngineError> {
        let from = self.state.migration_state;
        if !from.can_transition_to(to) {
            return Err(EngineError::InvalidTransition { from, to });
        }
        self.state.migration_state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
