use super::{phase_error, PhaseContext, PhaseResult};
use crate::domain::{MigrationExecutionError, MigrationPhase};

/// Restores the legacy store from the backup.
pub async fn run_rollback_phase(ctx: &PhaseContext) -> PhaseResult {
    ctx.reporter.detail("Restoring legacy data from backup");

    let restored = ctx
        .services
        .rollback
        .restore_to_legacy()
        .await
        .map_err(|e| phase_error(MigrationPhase::Rollback, e))?;

    if !restored {
        return Err(MigrationExecutionError::RollbackFailed(
            "legacy data could not be restored; manual intervention required".to_string(),
        ));
    }

    ctx.reporter.info("Legacy data restored");
    ctx.reporter.finish();
    Ok(())
}
