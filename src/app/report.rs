//! Plain-text rendering for the `migrator` CLI.

use crate::domain::{
    LogLevel, MigrationAssessment, MigrationState, MigrationSummary, ValidationResult,
    ValidationStatus, PHASE_TABLE,
};
use crate::state_machine::EngineSnapshot;
use std::fmt::Write;

fn percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn status_tag(status: ValidationStatus) -> &'static str {
    match status {
        ValidationStatus::Passed => "ok",
        ValidationStatus::Warning => "warn",
        ValidationStatus::Failed => "FAIL",
    }
}

fn level_tag(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "info",
        LogLevel::Warning => "warn",
        LogLevel::Error => "error",
    }
}

pub fn format_phase_table() -> String {
    let mut out = String::new();
    for descriptor in PHASE_TABLE.iter() {
        let _ = writeln!(
            out,
            "{:<12} {:>3}% - {:>3}%  {}",
            descriptor.name,
            percent(descriptor.range_start),
            percent(descriptor.range_end),
            descriptor.description
        );
    }
    out
}

/// One progress line, e.g. `[ 45%] Migration: Migrating contacts`.
pub fn progress_line(snapshot: &EngineSnapshot) -> String {
    let phase = snapshot
        .current_phase
        .map(|p| p.name())
        .unwrap_or_else(|| snapshot.migration_state.label());
    format!(
        "[{:>3}%] {}: {}",
        percent(snapshot.overall_progress),
        phase,
        snapshot.status_message
    )
}

pub fn format_assessment(assessment: &MigrationAssessment, checks: &[ValidationResult]) -> String {
    let mut out = String::new();
    if assessment.can_migrate {
        out.push_str("Assessment: ready to migrate\n");
    } else {
        let _ = writeln!(out, "Assessment: migration not possible ({})", assessment.reason);
    }
    for check in checks {
        let _ = writeln!(out, "  [{}] {} {}", status_tag(check.status), check.check, check.message);
    }
    out
}

pub fn format_summary(summary: &MigrationSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "State:    {}", summary.state);
    let _ = writeln!(out, "Progress: {}%", summary.percent());
    if let Some(elapsed) = summary.elapsed_display() {
        let _ = writeln!(out, "Elapsed:  {elapsed}");
    }
    if !summary.status_message.is_empty() {
        let _ = writeln!(out, "Status:   {}", summary.status_message);
    }
    if let Some(error) = &summary.error {
        let _ = writeln!(out, "Error:    {error}");
    }
    if summary.state == MigrationState::Failed && summary.error.as_ref().is_some_and(|e| e.is_terminal()) {
        out.push_str("Legacy data could not be restored. Manual intervention required.\n");
    }

    if !summary.recent_validation_results.is_empty() {
        out.push_str("\nValidation:\n");
        for result in &summary.recent_validation_results {
            let _ = writeln!(
                out,
                "  [{}] {} {}",
                status_tag(result.status),
                result.check,
                result.message
            );
        }
    }

    if !summary.recent_log_entries.is_empty() {
        out.push_str("\nRecent log:\n");
        for entry in &summary.recent_log_entries {
            let _ = writeln!(
                out,
                "  {} {:<5} {}",
                entry.timestamp.format("%H:%M:%S"),
                level_tag(entry.level),
                entry.message
            );
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
