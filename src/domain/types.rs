//! Lifecycle states, phases, and the static phase descriptor table.
//!
//! Every phase owns a half-open slice of the overall progress axis. The
//! forward phases tile `[0.0, 1.0]` exactly once; Rollback owns the full
//! range on its own since it never runs alongside a forward phase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level lifecycle of a migration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    #[default]
    NotStarted,
    AssessmentCompleted,
    InProgress,
    RollingBack,
    Completed,
    Failed,
}

impl MigrationState {
    /// Returns true if a rollback may be offered from this state.
    pub fn offers_rollback(&self) -> bool {
        !matches!(self, MigrationState::NotStarted | MigrationState::Completed)
    }

    /// Validates a transition against the lifecycle graph.
    ///
    /// Reset is not listed here: it bypasses the graph and always lands on
    /// `NotStarted`.
    pub fn can_transition_to(&self, next: MigrationState) -> bool {
        use MigrationState::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (AssessmentCompleted, InProgress)
                | (InProgress, AssessmentCompleted)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (InProgress, RollingBack)
                | (Failed, RollingBack)
                | (RollingBack, Failed)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            MigrationState::NotStarted => "Not started",
            MigrationState::AssessmentCompleted => "Assessment completed",
            MigrationState::InProgress => "In progress",
            MigrationState::RollingBack => "Rolling back",
            MigrationState::Completed => "Completed",
            MigrationState::Failed => "Failed",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A named step of the forward pipeline, or the rollback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    Assessment,
    Preparation,
    Backup,
    Migration,
    Validation,
    Completion,
    Rollback,
}

impl MigrationPhase {
    /// Phases run by `proceed()`, in execution order.
    pub const FORWARD_PIPELINE: [MigrationPhase; 5] = [
        MigrationPhase::Preparation,
        MigrationPhase::Backup,
        MigrationPhase::Migration,
        MigrationPhase::Validation,
        MigrationPhase::Completion,
    ];

    /// Returns the static descriptor for this phase.
    pub fn descriptor(&self) -> &'static PhaseDescriptor {
        let index = match self {
            MigrationPhase::Assessment => 0,
            MigrationPhase::Preparation => 1,
            MigrationPhase::Backup => 2,
            MigrationPhase::Migration => 3,
            MigrationPhase::Validation => 4,
            MigrationPhase::Completion => 5,
            MigrationPhase::Rollback => 6,
        };
        &PHASE_TABLE[index]
    }

    /// Returns true if cancelling while in this phase must go through the
    /// confirmed-rollback path instead of resetting directly.
    pub fn requires_rollback_confirmation(&self) -> bool {
        matches!(
            self,
            MigrationPhase::Backup
                | MigrationPhase::Migration
                | MigrationPhase::Validation
                | MigrationPhase::Completion
        )
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Static display metadata and progress slice for a phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDescriptor {
    pub phase: MigrationPhase,
    pub name: &'static str,
    pub description: &'static str,
    pub range_start: f64,
    pub range_end: f64,
}

impl PhaseDescriptor {
    /// Maps a phase-local fraction onto the overall progress axis.
    ///
    /// The local value is clamped into `[0, 1]`. Both ends map to the exact
    /// configured bounds so phase boundaries never drift.
    pub fn map_local(&self, local: f64) -> f64 {
        let local = if local.is_nan() {
            0.0
        } else {
            local.clamp(0.0, 1.0)
        };
        if local >= 1.0 {
            return self.range_end;
        }
        if local <= 0.0 {
            return self.range_start;
        }
        self.range_start + local * (self.range_end - self.range_start)
    }
}

/// Descriptor table, indexed in `MigrationPhase` declaration order.
pub const PHASE_TABLE: [PhaseDescriptor; 7] = [
    PhaseDescriptor {
        phase: MigrationPhase::Assessment,
        name: "Assessment",
        description: "Checking whether your data can be migrated",
        range_start: 0.0,
        range_end: 0.1,
    },
    PhaseDescriptor {
        phase: MigrationPhase::Preparation,
        name: "Preparation",
        description: "Setting up the privacy-first storage",
        range_start: 0.1,
        range_end: 0.2,
    },
    PhaseDescriptor {
        phase: MigrationPhase::Backup,
        name: "Backup",
        description: "Creating a restorable backup of your current data",
        range_start: 0.2,
        range_end: 0.4,
    },
    PhaseDescriptor {
        phase: MigrationPhase::Migration,
        name: "Migration",
        description: "Moving your data to the privacy-first storage",
        range_start: 0.4,
        range_end: 0.7,
    },
    PhaseDescriptor {
        phase: MigrationPhase::Validation,
        name: "Validation",
        description: "Verifying the migrated data",
        range_start: 0.7,
        range_end: 0.9,
    },
    PhaseDescriptor {
        phase: MigrationPhase::Completion,
        name: "Completion",
        description: "Enabling privacy features",
        range_start: 0.9,
        range_end: 1.0,
    },
    PhaseDescriptor {
        phase: MigrationPhase::Rollback,
        name: "Rollback",
        description: "Restoring your original data",
        range_start: 0.0,
        range_end: 1.0,
    },
];

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
