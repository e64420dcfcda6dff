use super::{phase_error, PhaseContext, PhaseResult};
use crate::domain::MigrationPhase;

/// Sets up the target store. Safe to repeat and never touches legacy data.
pub async fn run_preparation_phase(ctx: &PhaseContext) -> PhaseResult {
    ctx.reporter.detail("Setting up target storage and validation");
    ctx.services
        .preparation
        .prepare_target()
        .await
        .map_err(|e| phase_error(MigrationPhase::Preparation, e))?;

    ctx.reporter.info("Target storage prepared");
    ctx.reporter.finish();
    Ok(())
}
