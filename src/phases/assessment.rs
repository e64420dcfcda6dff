use super::{phase_error, PhaseContext, PhaseResult};
use crate::domain::{MigrationAssessment, MigrationPhase};

/// Runs the read-only eligibility check and the pre-migration validation battery.
///
/// A battery that aggregates to failed downgrades an otherwise eligible
/// assessment, so `proceed()` stays gated on both verdicts.
pub async fn run_assessment_phase(ctx: &PhaseContext) -> PhaseResult {
    let phase = MigrationPhase::Assessment;
    let reporter = &ctx.reporter;

    reporter.detail("Inspecting the legacy store");
    let readiness = ctx
        .services
        .assessment
        .assess_readiness()
        .await
        .map_err(|e| phase_error(phase, e))?;
    reporter.progress(0.5);

    reporter.detail("Running pre-migration validation");
    let validation = ctx
        .services
        .assessment
        .validate_all()
        .await
        .map_err(|e| phase_error(phase, e))?;

    let assessment = if readiness.can_migrate && validation.is_failed() {
        let reason = format!(
            "pre-migration validation reported {} failed check(s)",
            validation.failed_count()
        );
        reporter.warn(format!("Migration blocked: {}", reason));
        MigrationAssessment::blocked(reason)
    } else {
        readiness
    };

    if assessment.can_migrate {
        reporter.info("Assessment passed: data is ready to migrate");
    } else {
        reporter.warn(format!("Assessment blocked migration: {}", assessment.reason));
    }

    reporter.validation(validation);
    reporter.assessment(assessment);
    reporter.finish();
    Ok(())
}
