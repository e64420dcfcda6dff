//! Read-only, point-in-time projection of the engine for display.

use crate::domain::assessment::{MigrationAssessment, ValidationResult};
use crate::domain::errors::MigrationExecutionError;
use crate::domain::log_buffer::MigrationLogEntry;
use crate::domain::types::{MigrationPhase, MigrationState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Snapshot combining lifecycle, progress, and bounded recent history.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    pub state: MigrationState,
    pub phase: Option<MigrationPhase>,
    pub overall_progress: f64,
    pub current_step_progress: f64,
    pub status_message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed: Option<Duration>,
    pub assessment: Option<MigrationAssessment>,
    pub recent_log_entries: Vec<MigrationLogEntry>,
    pub recent_validation_results: Vec<ValidationResult>,
    pub error: Option<MigrationExecutionError>,
    pub showing_rollback_confirmation: bool,
}

impl MigrationSummary {
    /// Elapsed time formatted for display, if a run has started.
    pub fn elapsed_display(&self) -> Option<String> {
        self.elapsed.map(format_duration)
    }

    /// Overall progress as a whole percentage.
    pub fn percent(&self) -> u8 {
        (self.overall_progress.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Formats a duration as `"{m}m {ss}s"` from one minute up, else `"{s}.{d}s"`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}.{}s", secs, duration.subsec_millis() / 100)
    }
}
