use super::{phase_error, PhaseContext, PhaseResult};
use crate::domain::{MigrationExecutionError, MigrationPhase};

/// Enables the privacy-first features.
///
/// Failure here does not roll back: the data is already migrated and
/// validated, only activation failed.
pub async fn run_completion_phase(ctx: &PhaseContext) -> PhaseResult {
    ctx.reporter.detail("Enabling privacy features");

    let enabled = ctx
        .services
        .activator
        .enable_privacy_features()
        .await
        .map_err(|e| phase_error(MigrationPhase::Completion, e))?;

    if !enabled {
        return Err(MigrationExecutionError::CompletionFailed(
            "privacy features could not be enabled".to_string(),
        ));
    }

    ctx.reporter.info("Privacy features enabled");
    ctx.reporter.finish();
    Ok(())
}
