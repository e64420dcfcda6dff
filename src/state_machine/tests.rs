//! Tests for the migration state machine.

use super::*;
use crate::domain::{
    MigrationAssessment, MigrationExecutionError, ValidationResult, ValidationStatus,
    ValidationSummary,
};
use tempfile::TempDir;

/// Creates a test state machine with a logger in a temp directory.
fn create_test_machine() -> (
    MigrationStateMachine,
    watch::Receiver<EngineSnapshot>,
    TempDir,
) {
    create_machine_with_log(LogConfig::default())
}

fn create_machine_with_log(
    log: LogConfig,
) -> (
    MigrationStateMachine,
    watch::Receiver<EngineSnapshot>,
    TempDir,
) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = Arc::new(
        StructuredLogger::new("test-session", temp_dir.path()).expect("Failed to create logger"),
    );
    let (machine, snapshot_rx) = MigrationStateMachine::new(log, logger);
    (machine, snapshot_rx, temp_dir)
}

/// Drives the machine through an eligible assessment.
fn assess(machine: &mut MigrationStateMachine, assessment: MigrationAssessment) {
    machine
        .apply(StateCommand::BeginAssessment)
        .expect("BeginAssessment");
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Assessment))
        .expect("EnterPhase");
    machine
        .apply(StateCommand::RecordAssessment(assessment))
        .expect("RecordAssessment");
    machine
        .apply(StateCommand::CompletePhase(MigrationPhase::Assessment))
        .expect("CompletePhase");
    machine
        .apply(StateCommand::CompleteAssessment)
        .expect("CompleteAssessment");
}

#[test]
fn test_initial_state() {
    let (machine, snapshot_rx, _temp) = create_test_machine();

    let state = machine.state();
    assert_eq!(state.migration_state, MigrationState::NotStarted);
    assert_eq!(state.current_phase, None);
    assert_eq!(state.overall_progress, 0.0);
    assert!(state.logs.is_empty());
    assert!(!snapshot_rx.borrow().showing_rollback_confirmation);
}

#[test]
fn test_assessment_halts_in_assessment_completed() {
    let (mut machine, snapshot_rx, _temp) = create_test_machine();

    assess(&mut machine, MigrationAssessment::eligible());

    assert_eq!(
        machine.state().migration_state,
        MigrationState::AssessmentCompleted
    );
    assert_eq!(machine.state().overall_progress, 0.1);
    assert!(machine.state().started_at.is_some());

    let snapshot = snapshot_rx.borrow();
    assert_eq!(snapshot.migration_state, MigrationState::AssessmentCompleted);
    assert_eq!(snapshot.current_phase, Some(MigrationPhase::Assessment));
}

#[test]
fn test_begin_assessment_rejected_while_in_progress() {
    let (mut machine, _rx, _temp) = create_test_machine();
    machine.apply(StateCommand::BeginAssessment).unwrap();

    let err = machine.apply(StateCommand::BeginAssessment).unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidOrdering {
            operation: "start",
            state: MigrationState::InProgress
        }
    );
}

#[test]
fn test_begin_execution_requires_assessment() {
    let (mut machine, _rx, _temp) = create_test_machine();

    let err = machine.apply(StateCommand::BeginExecution).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOrdering { operation: "proceed", .. }));
    assert_eq!(machine.state().migration_state, MigrationState::NotStarted);
}

#[test]
fn test_begin_execution_blocked_assessment() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(
        &mut machine,
        MigrationAssessment::blocked("corrupted legacy store"),
    );

    let err = machine.apply(StateCommand::BeginExecution).unwrap_err();
    assert_eq!(
        err,
        EngineError::AssessmentBlocked {
            reason: "corrupted legacy store".into()
        }
    );
    assert_eq!(
        machine.state().migration_state,
        MigrationState::AssessmentCompleted
    );
}

#[test]
fn test_rejected_command_does_not_broadcast() {
    let (mut machine, snapshot_rx, _temp) = create_test_machine();

    assert!(machine.apply(StateCommand::BeginExecution).is_err());
    assert!(!snapshot_rx.has_changed().unwrap());
}

#[test]
fn test_enter_phase_uses_descriptor() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();

    let events = machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Backup))
        .unwrap();
    assert_eq!(
        events,
        vec![StateEvent::PhaseEntered {
            phase: MigrationPhase::Backup
        }]
    );

    let state = machine.state();
    assert_eq!(state.overall_progress, 0.2);
    assert_eq!(state.current_step_progress, 0.0);
    assert_eq!(state.status_message, "Backup");
    assert_eq!(
        state.detail_message,
        MigrationPhase::Backup.descriptor().description
    );
}

#[test]
fn test_rollback_phase_only_while_rolling_back() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();

    let err = machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Rollback))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOrdering { .. }));
}

#[test]
fn test_progress_maps_into_phase_slice() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Migration))
        .unwrap();

    machine
        .apply(StateCommand::ReportProgress { local: 0.5 })
        .unwrap();
    assert!((machine.state().overall_progress - 0.55).abs() < 1e-9);
    assert_eq!(machine.state().current_step_progress, 0.5);

    machine
        .apply(StateCommand::ReportProgress { local: 7.0 })
        .unwrap();
    assert_eq!(machine.state().overall_progress, 0.7);
    assert_eq!(machine.state().current_step_progress, 1.0);

    machine
        .apply(StateCommand::ReportProgress { local: f64::NAN })
        .unwrap();
    assert_eq!(machine.state().overall_progress, 0.4);
}

#[test]
fn test_notification_updates_status_message() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Migration))
        .unwrap();

    machine
        .apply(StateCommand::ApplyNotification {
            progress: 0.25,
            step: "Migrating transactions".into(),
        })
        .unwrap();

    assert_eq!(machine.state().status_message, "Migrating transactions");
    assert!((machine.state().overall_progress - 0.475).abs() < 1e-9);
}

#[test]
fn test_progress_without_phase_rejected() {
    let (mut machine, _rx, _temp) = create_test_machine();

    let err = machine
        .apply(StateCommand::ApplyNotification {
            progress: 0.5,
            step: "stray".into(),
        })
        .unwrap_err();
    assert_eq!(err, EngineError::NoActivePhase);
    assert_eq!(machine.state().status_message, "");
}

#[test]
fn test_complete_phase_snaps_to_range_end() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Validation))
        .unwrap();
    machine
        .apply(StateCommand::ReportProgress { local: 0.3 })
        .unwrap();

    machine
        .apply(StateCommand::CompletePhase(MigrationPhase::Validation))
        .unwrap();
    assert_eq!(machine.state().overall_progress, 0.9);
    assert_eq!(machine.state().current_step_progress, 1.0);

    let err = machine
        .apply(StateCommand::CompletePhase(MigrationPhase::Completion))
        .unwrap_err();
    assert_eq!(err, EngineError::NoActivePhase);
}

#[test]
fn test_fail_phase_records_error() {
    let (mut machine, snapshot_rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Backup))
        .unwrap();

    let error = MigrationExecutionError::BackupFailed("disk full".into());
    let events = machine
        .apply(StateCommand::FailPhase {
            error: error.clone(),
        })
        .unwrap();

    assert_eq!(
        events,
        vec![
            StateEvent::StateChanged {
                from: MigrationState::InProgress,
                to: MigrationState::Failed
            },
            StateEvent::ErrorRaised {
                error: error.clone()
            }
        ]
    );
    assert_eq!(machine.state().migration_error, Some(error.clone()));
    assert_eq!(machine.state().detail_message, "disk full");
    assert_eq!(snapshot_rx.borrow().migration_error, Some(error));
}

#[test]
fn test_automatic_rollback_skips_failed() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Migration))
        .unwrap();

    let cause = MigrationExecutionError::MigrationFailed("write timeout".into());
    let events = machine
        .apply(StateCommand::BeginRollback {
            cause: Some(cause.clone()),
        })
        .unwrap();

    assert_eq!(
        events[0],
        StateEvent::StateChanged {
            from: MigrationState::InProgress,
            to: MigrationState::RollingBack
        }
    );
    assert_eq!(machine.state().migration_error, Some(cause));

    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Rollback))
        .unwrap();
    assert_eq!(machine.state().overall_progress, 0.0);
}

#[test]
fn test_failed_rollback_is_failed() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::BeginRollback { cause: None })
        .unwrap();
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Rollback))
        .unwrap();

    machine
        .apply(StateCommand::FailPhase {
            error: MigrationExecutionError::RollbackFailed("restore failed".into()),
        })
        .unwrap();

    assert_eq!(machine.state().migration_state, MigrationState::Failed);
    assert_eq!(machine.state().status_message, "Rollback failed");
}

#[test]
fn test_complete_migration() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();

    machine.apply(StateCommand::CompleteMigration).unwrap();

    assert_eq!(machine.state().migration_state, MigrationState::Completed);
    assert_eq!(machine.state().overall_progress, 1.0);

    // Completed is terminal until reset
    assert!(machine.apply(StateCommand::BeginAssessment).is_err());
}

#[test]
fn test_rollback_confirmation_flag() {
    let (mut machine, _rx, _temp) = create_test_machine();

    // Nothing to roll back before anything ran
    assert!(machine
        .apply(StateCommand::RequestRollbackConfirmation)
        .is_err());
    assert_eq!(
        machine
            .apply(StateCommand::ResolveRollbackConfirmation { confirmed: true })
            .unwrap_err(),
        EngineError::NoRollbackPending
    );

    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();

    machine
        .apply(StateCommand::RequestRollbackConfirmation)
        .unwrap();
    assert!(machine.state().showing_rollback_confirmation);

    // Requesting twice is harmless
    let events = machine
        .apply(StateCommand::RequestRollbackConfirmation)
        .unwrap();
    assert!(events.is_empty());

    machine
        .apply(StateCommand::ResolveRollbackConfirmation { confirmed: false })
        .unwrap();
    assert!(!machine.state().showing_rollback_confirmation);
    assert_eq!(machine.state().migration_state, MigrationState::InProgress);
}

#[test]
fn test_begin_rollback_clears_confirmation() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::RequestRollbackConfirmation)
        .unwrap();

    machine
        .apply(StateCommand::BeginRollback { cause: None })
        .unwrap();
    assert!(!machine.state().showing_rollback_confirmation);
}

#[test]
fn test_complete_migration_withdraws_unanswered_confirmation() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::RequestRollbackConfirmation)
        .unwrap();

    let events = machine.apply(StateCommand::CompleteMigration).unwrap();

    assert!(!machine.state().showing_rollback_confirmation);
    assert!(events.contains(&StateEvent::RollbackConfirmationResolved { confirmed: false }));
    assert_eq!(
        machine
            .apply(StateCommand::ResolveRollbackConfirmation { confirmed: true })
            .unwrap_err(),
        EngineError::NoRollbackPending
    );
}

#[test]
fn test_fail_phase_keeps_unanswered_confirmation() {
    let (mut machine, _rx, _temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine.apply(StateCommand::BeginExecution).unwrap();
    machine
        .apply(StateCommand::RequestRollbackConfirmation)
        .unwrap();

    machine
        .apply(StateCommand::FailPhase {
            error: MigrationExecutionError::BackupFailed("disk full".into()),
        })
        .unwrap();

    assert_eq!(machine.state().migration_state, MigrationState::Failed);
    assert!(machine.state().showing_rollback_confirmation);
}

#[test]
fn test_reset_restores_initial_values() {
    let (mut machine, snapshot_rx, temp) = create_test_machine();
    assess(&mut machine, MigrationAssessment::eligible());
    machine
        .apply(StateCommand::RecordValidation(ValidationSummary::from_results(
            vec![ValidationResult::new(
                "record counts",
                ValidationStatus::Passed,
                "ok",
            )],
        )))
        .unwrap();
    machine.apply(StateCommand::info("about to reset")).unwrap();

    let events = machine.apply(StateCommand::Reset).unwrap();
    assert_eq!(events.last(), Some(&StateEvent::EngineReset));

    let state = machine.state();
    assert_eq!(state.migration_state, MigrationState::NotStarted);
    assert_eq!(state.current_phase, None);
    assert_eq!(state.overall_progress, 0.0);
    assert!(state.assessment.is_none());
    assert!(state.validation_results.is_empty());
    assert!(state.logs.is_empty());
    assert!(state.started_at.is_none());
    assert_eq!(snapshot_rx.borrow().migration_state, MigrationState::NotStarted);

    // The structured log moves on to the next run
    let content = std::fs::read_to_string(temp.path().join("events.jsonl")).unwrap();
    let last: serde_json::Value =
        serde_json::from_str(content.lines().last().unwrap()).unwrap();
    assert_eq!(last["run_id"], 2);
}

#[test]
fn test_log_entries_tagged_with_phase() {
    let (mut machine, _rx, _temp) = create_test_machine();
    machine.apply(StateCommand::info("before start")).unwrap();
    machine.apply(StateCommand::BeginAssessment).unwrap();
    machine
        .apply(StateCommand::EnterPhase(MigrationPhase::Assessment))
        .unwrap();
    machine.apply(StateCommand::warning("slow disk")).unwrap();

    let entries: Vec<_> = machine.state().logs.entries().cloned().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].phase, None);
    assert_eq!(entries[1].phase, Some(MigrationPhase::Assessment));
    assert_eq!(entries[1].level, LogLevel::Warning);
}

#[test]
fn test_log_trim_reported_in_event() {
    let (mut machine, _rx, _temp) = create_machine_with_log(LogConfig {
        ceiling: 3,
        trim_batch: 2,
    });

    for i in 0..3 {
        machine.apply(StateCommand::info(format!("line {i}"))).unwrap();
    }
    let events = machine.apply(StateCommand::error("line 3")).unwrap();

    assert_eq!(
        events,
        vec![StateEvent::LogAppended {
            level: LogLevel::Error,
            dropped: 2
        }]
    );
    assert_eq!(machine.state().logs.len(), 2);
}

#[test]
fn test_summary_bounds_history() {
    let (mut machine, _rx, _temp) = create_test_machine();
    for i in 0..30 {
        machine.apply(StateCommand::info(format!("entry {i}"))).unwrap();
    }

    let summary = machine.summary(&SummaryConfig {
        recent_log_entries: 5,
        recent_validation_results: 10,
    });
    assert_eq!(summary.recent_log_entries.len(), 5);
    assert_eq!(summary.recent_log_entries[4].message, "entry 29");
    assert_eq!(summary.state, MigrationState::NotStarted);
    assert!(summary.elapsed.is_none());
}
