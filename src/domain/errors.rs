//! Error types for migration execution and engine call ordering.

use crate::domain::types::{MigrationPhase, MigrationState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A phase-local failure, converted at the phase boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MigrationExecutionError {
    #[error("assessment failed: {0}")]
    AssessmentFailed(String),
    #[error("preparation failed: {0}")]
    PreparationFailed(String),
    #[error("backup failed: {0}")]
    BackupFailed(String),
    #[error("migration failed: {0}")]
    MigrationFailed(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("completion failed: {0}")]
    CompletionFailed(String),
    #[error("rollback failed: {0}")]
    RollbackFailed(String),
}

impl MigrationExecutionError {
    /// Builds the variant owned by `phase`.
    pub fn for_phase(phase: MigrationPhase, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match phase {
            MigrationPhase::Assessment => Self::AssessmentFailed(detail),
            MigrationPhase::Preparation => Self::PreparationFailed(detail),
            MigrationPhase::Backup => Self::BackupFailed(detail),
            MigrationPhase::Migration => Self::MigrationFailed(detail),
            MigrationPhase::Validation => Self::ValidationFailed(detail),
            MigrationPhase::Completion => Self::CompletionFailed(detail),
            MigrationPhase::Rollback => Self::RollbackFailed(detail),
        }
    }

    /// Returns true if this failure must roll back without asking the user.
    ///
    /// Only Migration and Validation run after destructive writes may have
    /// committed. Completion is deliberately excluded: the data is migrated
    /// and validated, only feature activation failed.
    pub fn requires_automatic_rollback(&self) -> bool {
        matches!(self, Self::MigrationFailed(_) | Self::ValidationFailed(_))
    }

    pub fn phase(&self) -> MigrationPhase {
        match self {
            Self::AssessmentFailed(_) => MigrationPhase::Assessment,
            Self::PreparationFailed(_) => MigrationPhase::Preparation,
            Self::BackupFailed(_) => MigrationPhase::Backup,
            Self::MigrationFailed(_) => MigrationPhase::Migration,
            Self::ValidationFailed(_) => MigrationPhase::Validation,
            Self::CompletionFailed(_) => MigrationPhase::Completion,
            Self::RollbackFailed(_) => MigrationPhase::Rollback,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::AssessmentFailed(d)
            | Self::PreparationFailed(d)
            | Self::BackupFailed(d)
            | Self::MigrationFailed(d)
            | Self::ValidationFailed(d)
            | Self::CompletionFailed(d)
            | Self::RollbackFailed(d) => d,
        }
    }

    /// A failed rollback leaves the data in a state software cannot repair.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RollbackFailed(_))
    }
}

/// Rejections of control-surface calls. None of these change engine state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cannot {operation} while migration is {state}")]
    InvalidOrdering {
        operation: &'static str,
        state: MigrationState,
    },
    #[error("migration is not allowed: {reason}")]
    AssessmentBlocked { reason: String },
    #[error("no rollback confirmation is pending")]
    NoRollbackPending,
    #[error("rollback was abandoned by a reset")]
    RollbackAbandoned,
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: MigrationState,
        to: MigrationState,
    },
    #[error("no phase is active")]
    NoActivePhase,
    #[error("migration engine has stopped")]
    EngineStopped,
}
