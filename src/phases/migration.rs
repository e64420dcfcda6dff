use super::{phase_error, PhaseContext, PhaseResult};
use crate::collaborators::MigrationOutcome;
use crate::domain::{MigrationExecutionError, MigrationPhase};

/// Runs the irreversible transform. Any failure from here on rolls back.
pub async fn run_migration_phase(ctx: &PhaseContext) -> PhaseResult {
    ctx.reporter.detail("Transferring records to the privacy-first store");

    let outcome = ctx
        .services
        .executor
        .execute_migration()
        .await
        .map_err(|e| phase_error(MigrationPhase::Migration, e))?;

    match outcome {
        MigrationOutcome::Success => {
            ctx.reporter.info("Data migrated");
            ctx.reporter.finish();
            Ok(())
        }
        MigrationOutcome::Failed { detail } => Err(MigrationExecutionError::MigrationFailed(detail)),
    }
}
