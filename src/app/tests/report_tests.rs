use super::*;
use crate::domain::{MigrationExecutionError, MigrationPhase};
use std::time::Duration;

fn summary(state: MigrationState) -> MigrationSummary {
    MigrationSummary {
        state,
        phase: None,
        overall_progress: 1.0,
        current_step_progress: 1.0,
        status_message: "Migration complete".to_string(),
        started_at: None,
        elapsed: Some(Duration::from_millis(83_000)),
        assessment: Some(MigrationAssessment::eligible()),
        recent_log_entries: Vec::new(),
        recent_validation_results: Vec::new(),
        error: None,
        showing_rollback_confirmation: false,
    }
}

fn snapshot() -> EngineSnapshot {
    EngineSnapshot {
        migration_state: MigrationState::InProgress,
        current_phase: Some(MigrationPhase::Migration),
        overall_progress: 0.55,
        current_step_progress: 0.5,
        status_message: "Migrating contacts".to_string(),
        detail_message: String::new(),
        migration_assessment: None,
        validation_results: Vec::new(),
        migration_error: None,
        showing_rollback_confirmation: false,
    }
}

#[test]
fn test_phase_table_lists_every_phase_with_its_slice() {
    let table = format_phase_table();

    assert_eq!(table.lines().count(), PHASE_TABLE.len());
    let migration = table.lines().find(|l| l.starts_with("Migration ")).unwrap();
    assert!(migration.contains(" 40% -  70%"), "{migration}");
}

#[test]
fn test_progress_line_uses_phase_name() {
    assert_eq!(progress_line(&snapshot()), "[ 55%] Migration: Migrating contacts");
}

#[test]
fn test_progress_line_falls_back_to_state_label() {
    let mut snap = snapshot();
    snap.current_phase = None;
    snap.migration_state = MigrationState::Completed;
    snap.overall_progress = 1.0;

    assert!(progress_line(&snap).starts_with("[100%] Completed:"));
}

#[test]
fn test_blocked_assessment_shows_reason_and_checks() {
    let checks = vec![ValidationResult::new(
        "schema_version",
        ValidationStatus::Failed,
        "unsupported",
    )];

    let text = format_assessment(&MigrationAssessment::blocked("legacy store is locked"), &checks);

    assert!(text.contains("migration not possible (legacy store is locked)"));
    assert!(text.contains("[FAIL] schema_version unsupported"));
}

#[test]
fn test_summary_shows_state_progress_and_elapsed() {
    let text = format_summary(&summary(MigrationState::Completed));

    assert!(text.contains("State:    Completed"));
    assert!(text.contains("Progress: 100%"));
    assert!(text.contains("Elapsed:  1m 23s"));
    assert!(!text.contains("Manual intervention"));
}

#[test]
fn test_summary_flags_failed_rollback() {
    let mut failed = summary(MigrationState::Failed);
    failed.error = Some(MigrationExecutionError::RollbackFailed("disk full".into()));

    let text = format_summary(&failed);

    assert!(text.contains("Error:    rollback failed: disk full"));
    assert!(text.contains("Manual intervention required"));
}
