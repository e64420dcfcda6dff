//! Tests for lifecycle states and the phase descriptor table.

use super::*;
use proptest::prelude::*;

#[test]
fn test_forward_ranges_tile_unit_interval() {
    let mut cursor = 0.0;
    let mut phases = vec![MigrationPhase::Assessment];
    phases.extend(MigrationPhase::FORWARD_PIPELINE);

    for phase in phases {
        let descriptor = phase.descriptor();
        assert_eq!(
            descriptor.range_start, cursor,
            "{} must start where the previous phase ended",
            descriptor.name
        );
        assert!(descriptor.range_end > descriptor.range_start);
        cursor = descriptor.range_end;
    }

    assert_eq!(cursor, 1.0);
}

#[test]
fn test_rollback_owns_full_range() {
    let rollback = MigrationPhase::Rollback.descriptor();
    assert_eq!(rollback.range_start, 0.0);
    assert_eq!(rollback.range_end, 1.0);
}

#[test]
fn test_descriptor_table_matches_phase() {
    for descriptor in PHASE_TABLE.iter() {
        assert_eq!(descriptor.phase.descriptor(), descriptor);
    }
}

#[test]
fn test_map_local_hits_boundaries_exactly() {
    for descriptor in PHASE_TABLE.iter() {
        assert_eq!(descriptor.map_local(0.0), descriptor.range_start);
        assert_eq!(descriptor.map_local(1.0), descriptor.range_end);
    }
}

#[test]
fn test_map_local_clamps_out_of_range_values() {
    let backup = MigrationPhase::Backup.descriptor();
    assert_eq!(backup.map_local(-0.5), backup.range_start);
    assert_eq!(backup.map_local(3.0), backup.range_end);
    assert_eq!(backup.map_local(f64::NAN), backup.range_start);
    assert!((backup.map_local(0.5) - 0.3).abs() < 1e-12);
}

#[test]
fn test_confirmation_boundary_starts_at_backup() {
    assert!(!MigrationPhase::Assessment.requires_rollback_confirmation());
    assert!(!MigrationPhase::Preparation.requires_rollback_confirmation());
    assert!(MigrationPhase::Backup.requires_rollback_confirmation());
    assert!(MigrationPhase::Migration.requires_rollback_confirmation());
    assert!(MigrationPhase::Validation.requires_rollback_confirmation());
    assert!(MigrationPhase::Completion.requires_rollback_confirmation());
    assert!(!MigrationPhase::Rollback.requires_rollback_confirmation());
}

#[test]
fn test_rollback_offered_only_outside_not_started_and_completed() {
    assert!(!MigrationState::NotStarted.offers_rollback());
    assert!(!MigrationState::Completed.offers_rollback());
    assert!(MigrationState::AssessmentCompleted.offers_rollback());
    assert!(MigrationState::InProgress.offers_rollback());
    assert!(MigrationState::Failed.offers_rollback());
    assert!(MigrationState::RollingBack.offers_rollback());
}

#[test]
fn test_lifecycle_transitions() {
    use MigrationState::*;
    assert!(NotStarted.can_transition_to(InProgress));
    assert!(AssessmentCompleted.can_transition_to(InProgress));
    assert!(InProgress.can_transition_to(RollingBack));
    assert!(Failed.can_transition_to(RollingBack));
    assert!(RollingBack.can_transition_to(Failed));

    assert!(!Completed.can_transition_to(InProgress));
    assert!(!NotStarted.can_transition_to(Completed));
    assert!(!RollingBack.can_transition_to(InProgress));
    assert!(!Failed.can_transition_to(Completed));
}

proptest! {
    #[test]
    fn prop_mapped_progress_stays_inside_phase_slice(local in -2.0f64..3.0, index in 0usize..7) {
        let descriptor = &PHASE_TABLE[index];
        let overall = descriptor.map_local(local);
        prop_assert!(overall >= descriptor.range_start);
        prop_assert!(overall <= descriptor.range_end);
    }

    #[test]
    fn prop_mapped_progress_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0, index in 0usize..7) {
        let descriptor = &PHASE_TABLE[index];
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(descriptor.map_local(low) <= descriptor.map_local(high));
    }
}
