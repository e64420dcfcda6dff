//! Engine-owned state. Only `MigrationStateMachine` holds a mutable reference.

use crate::config::LogConfig;
use crate::domain::{
    MigrationAssessment, MigrationExecutionError, MigrationLogBuffer, MigrationPhase,
    MigrationState, ValidationResult,
};
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineState {
    pub migration_state: MigrationState,
    /// `None` until the first phase is entered.
    pub current_phase: Option<MigrationPhase>,
    pub overall_progress: f64,
    pub current_step_progress: f64,
    pub status_message: String,
    pub detail_message: String,
    pub assessment: Option<MigrationAssessment>,
    pub validation_results: Vec<ValidationResult>,
    pub migration_error: Option<MigrationExecutionError>,
    pub showing_rollback_confirmation: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub logs: MigrationLogBuffer,
}

impl EngineState {
    pub fn new(log: &LogConfig) -> Self {
        Self {
            migration_state: MigrationState::NotStarted,
            current_phase: None,
            overall_progress: 0.0,
            current_step_progress: 0.0,
            status_message: String::new(),
            detail_message: String::new(),
            assessment: None,
            validation_results: Vec::new(),
            migration_error: None,
            showing_rollback_confirmation: false,
            started_at: None,
            logs: MigrationLogBuffer::new(log.ceiling, log.trim_batch),
        }
    }

    /// Time since `start()`, if a run has started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at
            .map(|started| (Utc::now() - started).to_std().unwrap_or_default())
    }
}
