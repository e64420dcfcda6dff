//! Phase runners for the forward pipeline and rollback.
//!
//! Runners never touch engine state. They call collaborators, report through
//! `PhaseReporter`, and return a single completion signal.

pub mod assessment;
pub mod backup;
pub mod completion;
pub mod migration;
pub mod preparation;
pub mod reporter;
pub mod rollback;
pub mod validation;

pub use assessment::run_assessment_phase;
pub use backup::run_backup_phase;
pub use completion::run_completion_phase;
pub use migration::run_migration_phase;
pub use preparation::run_preparation_phase;
pub use reporter::{PhaseReporter, PhaseUpdate};
pub use rollback::run_rollback_phase;
pub use validation::run_validation_phase;

use crate::collaborators::MigrationServices;
use crate::domain::{MigrationExecutionError, MigrationPhase};
use std::time::Duration;

/// Everything a runner may use.
#[derive(Clone)]
pub struct PhaseContext {
    pub services: MigrationServices,
    pub reporter: PhaseReporter,
}

pub type PhaseResult = Result<(), MigrationExecutionError>;

/// Runs one phase to its completion signal.
pub async fn run_phase(phase: MigrationPhase, ctx: PhaseContext) -> PhaseResult {
    match phase {
        MigrationPhase::Assessment => run_assessment_phase(&ctx).await,
        MigrationPhase::Preparation => run_preparation_phase(&ctx).await,
        MigrationPhase::Backup => run_backup_phase(&ctx).await,
        MigrationPhase::Migration => run_migration_phase(&ctx).await,
        MigrationPhase::Validation => run_validation_phase(&ctx).await,
        MigrationPhase::Completion => run_completion_phase(&ctx).await,
        MigrationPhase::Rollback => run_rollback_phase(&ctx).await,
    }
}

/// Runs a phase, failing it with its own error variant if it outlives `timeout`.
pub async fn run_phase_with_timeout(
    phase: MigrationPhase,
    timeout: Option<Duration>,
    ctx: PhaseContext,
) -> PhaseResult {
    let Some(limit) = timeout else {
        return run_phase(phase, ctx).await;
    };

    match tokio::time::timeout(limit, run_phase(phase, ctx)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} phase timed out after {:?}", phase, limit);
            Err(MigrationExecutionError::for_phase(
                phase,
                format!("timed out after {}s", limit.as_secs()),
            ))
        }
    }
}

/// Converts a collaborator error into the phase's failure variant.
pub(crate) fn phase_error(phase: MigrationPhase, err: anyhow::Error) -> MigrationExecutionError {
    MigrationExecutionError::for_phase(phase, format!("{:#}", err))
}

#[cfg(test)]
#[path = "tests/phases_tests.rs"]
mod tests;
