use super::{phase_error, PhaseContext, PhaseResult};
use crate::domain::{MigrationExecutionError, MigrationPhase};

/// Snapshots the legacy store segment by segment.
///
/// Progress advances by one step per segment. A failure here leaves the
/// legacy data untouched.
pub async fn run_backup_phase(ctx: &PhaseContext) -> PhaseResult {
    let phase = MigrationPhase::Backup;
    let backup = &ctx.services.backup;
    let reporter = &ctx.reporter;

    let segments = backup
        .data_segments()
        .await
        .map_err(|e| phase_error(phase, e))?;
    let total = segments.len();

    for (index, segment) in segments.iter().enumerate() {
        reporter.detail(format!("Backing up {} ({}/{})", segment, index + 1, total));
        backup.backup_segment(segment).await.map_err(|e| {
            MigrationExecutionError::BackupFailed(format!("segment '{}': {:#}", segment, e))
        })?;
        reporter.progress((index + 1) as f64 / total as f64);
    }

    reporter.info(format!("Backup created ({} segment(s))", total));
    reporter.finish();
    Ok(())
}
