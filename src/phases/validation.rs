use super::{phase_error, PhaseContext, PhaseResult};
use crate::domain::{MigrationExecutionError, MigrationPhase};

/// Re-runs the validation battery against the migrated store.
///
/// A failed aggregate is reported like a thrown error so the engine rolls
/// back instead of leaving unvalidated data active.
pub async fn run_validation_phase(ctx: &PhaseContext) -> PhaseResult {
    ctx.reporter.detail("Validating migrated data");

    let summary = ctx
        .services
        .assessment
        .validate_all()
        .await
        .map_err(|e| phase_error(MigrationPhase::Validation, e))?;

    let failed = summary.failed_count();
    let total = summary.results.len();
    let is_failed = summary.is_failed();
    ctx.reporter.validation(summary);

    if is_failed {
        return Err(MigrationExecutionError::ValidationFailed(format!(
            "{} of {} check(s) failed",
            failed, total
        )));
    }

    ctx.reporter
        .info(format!("Validation passed ({} check(s))", total));
    ctx.reporter.finish();
    Ok(())
}
