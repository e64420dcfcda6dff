//! Events emitted by the state machine after processing commands.
//!
//! These are for logging purposes only. Observers get state through the
//! watch channel's `EngineSnapshot`.

use crate::domain::{LogLevel, MigrationExecutionError, MigrationPhase, MigrationState, ValidationStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    StateChanged {
        from: MigrationState,
        to: MigrationState,
    },
    PhaseEntered {
        phase: MigrationPhase,
    },
    ProgressUpdated {
        overall_progress: f64,
        step_progress: f64,
    },
    PhaseCompleted {
        phase: MigrationPhase,
        overall_progress: f64,
    },
    AssessmentRecorded {
        can_migrate: bool,
    },
    ValidationRecorded {
        overall_status: ValidationStatus,
        results: usize,
    },
    ErrorRaised {
        error: MigrationExecutionError,
    },
    RollbackConfirmationRequested,
    RollbackConfirmationResolved {
        confirmed: bool,
    },
    LogAppended {
        level: LogLevel,
        dropped: usize,
    },
    EngineReset,
}
