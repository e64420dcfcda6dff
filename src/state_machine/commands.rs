//! Commands that can mutate engine-owned state.
//!
//! All state changes MUST go through the state machine's `apply()` method.
//! Phases and collaborators never construct these directly; the engine
//! translates their callbacks into commands.

use crate::domain::{
    LogLevel, MigrationAssessment, MigrationExecutionError, MigrationPhase, ValidationSummary,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub enum StateCommand {
    // Lifecycle
    /// Begin a new assessment run; valid from NotStarted or AssessmentCompleted
    BeginAssessment,
    /// Store the verdict of the assessment phase
    RecordAssessment(MigrationAssessment),
    /// Assessment finished, halt and wait for the user
    CompleteAssessment,
    /// User confirmed; requires an eligible assessment
    BeginExecution,
    /// Forward pipeline finished
    CompleteMigration,
    /// Stop with a failure that does not roll back on its own
    FailPhase { error: MigrationExecutionError },
    /// Enter RollingBack, recording the failure that caused it if any
    BeginRollback {
        cause: Option<MigrationExecutionError>,
    },
    /// Return every engine-owned field to its initial value
    Reset,

    // Phase progress
    EnterPhase(MigrationPhase),
    /// Phase-local progress reported by the running phase
    ReportProgress { local: f64 },
    /// Progress delivered by the notification bridge
    ApplyNotification { progress: f64, step: String },
    CompletePhase(MigrationPhase),
    SetStatus(String),
    SetDetail(String),
    RecordValidation(ValidationSummary),

    // Rollback confirmation
    RequestRollbackConfirmation,
    ResolveRollbackConfirmation { confirmed: bool },

    /// Append to the log buffer, tagged with the active phase
    Log { level: LogLevel, message: String },
}

impl StateCommand {
    pub fn info(message: impl Into<String>) -> Self {
        StateCommand::Log {
            level: LogLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        StateCommand::Log {
            level: LogLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StateCommand::Log {
            level: LogLevel::Error,
            message: message.into(),
        }
    }
}
