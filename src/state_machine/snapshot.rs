//! Read-only views of engine state for observers.
//!
//! Observers NEVER mutate these; they receive new snapshots via the watch
//! channel or request a summary from the engine.

use super::state::EngineState;
use crate::config::SummaryConfig;
use crate::domain::{
    MigrationAssessment, MigrationExecutionError, MigrationPhase, MigrationState,
    MigrationSummary, ValidationResult,
};

/// The UI consumption surface, republished after every command.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub migration_state: MigrationState,
    pub current_phase: Option<MigrationPhase>,
    pub overall_progress: f64,
    pub current_step_progress: f64,
    pub status_message: String,
    pub detail_message: String,
    pub migration_assessment: Option<MigrationAssessment>,
    pub validation_results: Vec<ValidationResult>,
    pub migration_error: Option<MigrationExecutionError>,
    pub showing_rollback_confirmation: bool,
}

impl From<&EngineState> for EngineSnapshot {
    fn from(state: &EngineState) -> Self {
        Self {
            migration_state: state.migration_state,
            current_phase: state.current_phase,
            overall_progress: state.overall_progress,
            current_step_progress: state.current_step_progress,
            status_message: state.status_message.clone(),
            detail_message: state.detail_message.clone(),
            migration_assessment: state.assessment.clone(),
            validation_results: state.validation_results.clone(),
            migration_error: state.migration_error.clone(),
            showing_rollback_confirmation: state.showing_rollback_confirmation,
        }
    }
}

impl MigrationSummary {
    /// Captures a summary with history bounded by `limits`.
    pub fn capture(state: &EngineState, limits: &SummaryConfig) -> Self {
        let skip = state
            .validation_results
            .len()
            .saturating_sub(limits.recent_validation_results);

        Self {
            state: state.migration_state,
            phase: state.current_phase,
            overall_progress: state.overall_progress,
            current_step_progress: state.current_step_progress,
            status_message: state.status_message.clone(),
            started_at: state.started_at,
            elapsed: state.elapsed(),
            assessment: state.assessment.clone(),
            recent_log_entries: state.logs.recent(limits.recent_log_entries),
            recent_validation_results: state.validation_results[skip..].to_vec(),
            error: state.migration_error.clone(),
            showing_rollback_confirmation: state.showing_rollback_confirmation,
        }
    }
}
