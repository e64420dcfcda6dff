//! Assessment and validation results produced by the assessment collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Eligibility verdict from a single assessment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationAssessment {
    pub can_migrate: bool,
    /// Human-readable explanation. Always set when `can_migrate` is false.
    #[serde(default)]
    pub reason: String,
}

impl MigrationAssessment {
    pub fn eligible() -> Self {
        Self {
            can_migrate: true,
            reason: String::new(),
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            can_migrate: false,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Warning,
    Failed,
}

/// Outcome of one structural or consistency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub check: String,
    pub status: ValidationStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Utc::now")]
    pub checked_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn new(check: impl Into<String>, status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status,
            message: message.into(),
            checked_at: Utc::now(),
        }
    }
}

/// A battery of validation results with its aggregate status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub results: Vec<ValidationResult>,
    pub overall_status: ValidationStatus,
}

impl ValidationSummary {
    /// Builds a summary, deriving the aggregate from the individual results.
    ///
    /// Any `Failed` result fails the battery; otherwise any `Warning` makes
    /// it a warning. An empty battery passes.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let overall_status = if results.iter().any(|r| r.status == ValidationStatus::Failed) {
            ValidationStatus::Failed
        } else if results.iter().any(|r| r.status == ValidationStatus::Warning) {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Passed
        };
        Self {
            results,
            overall_status,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.overall_status == ValidationStatus::Failed
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ValidationStatus::Failed)
            .count()
    }
}
