//! Scenario-driven collaborators.
//!
//! `ScriptedCollaborators` plays every collaborator role from a YAML
//! `Scenario`. The `migrator` binary uses it for dry runs and the engine
//! tests use it to script success and failure paths.

use crate::collaborators::{
    AssessmentService, BackupService, FeatureActivator, MigrationExecutor, MigrationOutcome,
    PreparationService, RollbackService,
};
use crate::domain::{
    MigrationAssessment, ValidationResult, ValidationStatus, ValidationSummary,
};
use crate::notifications::ProgressNotifier;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const HAPPY_PATH_YAML: &str = include_str!("../scenarios/happy-path.yaml");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default = "default_true")]
    pub can_migrate: bool,
    #[serde(default)]
    pub readiness_reason: String,
    /// Checks returned by the first `validate_all()` call.
    #[serde(default)]
    pub pre_validation: Vec<ScriptedCheck>,
    /// Checks returned by every later `validate_all()` call.
    #[serde(default)]
    pub post_validation: Vec<ScriptedCheck>,
    #[serde(default)]
    pub preparation_error: Option<String>,
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub failing_segment: Option<String>,
    #[serde(default)]
    pub migration: ScriptedMigration,
    #[serde(default = "default_true")]
    pub rollback_succeeds: bool,
    #[serde(default = "default_true")]
    pub activation_succeeds: bool,
    /// Delay applied before every scripted step.
    #[serde(default)]
    pub step_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScriptedMigration {
    /// Step names published as progress notifications, evenly spaced.
    #[serde(default)]
    pub steps: Vec<String>,
    /// When set, the transform reports failure with this detail.
    #[serde(default)]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptedCheck {
    pub name: String,
    pub status: ValidationStatus,
    #[serde(default)]
    pub message: String,
}

fn default_true() -> bool {
    true
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            can_migrate: true,
            readiness_reason: String::new(),
            pre_validation: Vec::new(),
            post_validation: Vec::new(),
            preparation_error: None,
            segments: Vec::new(),
            failing_segment: None,
            migration: ScriptedMigration::default(),
            rollback_succeeds: true,
            activation_succeeds: true,
            step_delay_ms: 0,
        }
    }
}

impl Scenario {
    pub fn happy_path() -> Self {
        serde_yaml::from_str(HAPPY_PATH_YAML)
            .expect("Failed to parse embedded happy-path.yaml - this is a bug in the scenario file")
    }

    pub fn happy_path_yaml() -> &'static str {
        HAPPY_PATH_YAML
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scenario file as YAML: {}", path.display()))
    }
}

fn summarize(checks: &[ScriptedCheck]) -> ValidationSummary {
    ValidationSummary::from_results(
        checks
            .iter()
            .map(|c| ValidationResult::new(&c.name, c.status, &c.message))
            .collect(),
    )
}

/// How many times each collaborator operation ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub assess: usize,
    pub validate: usize,
    pub prepare: usize,
    pub backup_segment: usize,
    pub execute: usize,
    pub restore: usize,
    pub activate: usize,
}

#[derive(Debug, Default)]
struct Counters {
    assess: AtomicUsize,
    validate: AtomicUsize,
    prepare: AtomicUsize,
    backup_segment: AtomicUsize,
    execute: AtomicUsize,
    restore: AtomicUsize,
    activate: AtomicUsize,
}

pub struct ScriptedCollaborators {
    scenario: Scenario,
    notifier: Option<ProgressNotifier>,
    counters: Counters,
}

impl ScriptedCollaborators {
    pub fn new(scenario: Scenario, notifier: Option<ProgressNotifier>) -> Self {
        Self {
            scenario,
            notifier,
            counters: Counters::default(),
        }
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            assess: c.assess.load(Ordering::SeqCst),
            validate: c.validate.load(Ordering::SeqCst),
            prepare: c.prepare.load(Ordering::SeqCst),
            backup_segment: c.backup_segment.load(Ordering::SeqCst),
            execute: c.execute.load(Ordering::SeqCst),
            restore: c.restore.load(Ordering::SeqCst),
            activate: c.activate.load(Ordering::SeqCst),
        }
    }

    async fn pause(&self) {
        if self.scenario.step_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.scenario.step_delay_ms)).await;
        }
    }
}

#[async_trait]
impl AssessmentService for ScriptedCollaborators {
    async fn assess_readiness(&self) -> Result<MigrationAssessment> {
        self.counters.assess.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.scenario.can_migrate {
            Ok(MigrationAssessment::eligible())
        } else {
            Ok(MigrationAssessment::blocked(&self.scenario.readiness_reason))
        }
    }

    async fn validate_all(&self) -> Result<ValidationSummary> {
        let previous = self.counters.validate.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if previous == 0 {
            Ok(summarize(&self.scenario.pre_validation))
        } else {
            Ok(summarize(&self.scenario.post_validation))
        }
    }
}

#[async_trait]
impl PreparationService for ScriptedCollaborators {
    async fn prepare_target(&self) -> Result<()> {
        self.counters.prepare.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match &self.scenario.preparation_error {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackupService for ScriptedCollaborators {
    async fn data_segments(&self) -> Result<Vec<String>> {
        Ok(self.scenario.segments.clone())
    }

    async fn backup_segment(&self, segment: &str) -> Result<()> {
        self.counters.backup_segment.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.scenario.failing_segment.as_deref() == Some(segment) {
            anyhow::bail!("could not write backup for {}", segment);
        }
        Ok(())
    }
}

#[async_trait]
impl MigrationExecutor for ScriptedCollaborators {
    async fn execute_migration(&self) -> Result<MigrationOutcome> {
        self.counters.execute.fetch_add(1, Ordering::SeqCst);
        let steps = &self.scenario.migration.steps;
        for (index, step) in steps.iter().enumerate() {
            self.pause().await;
            if let Some(notifier) = &self.notifier {
                notifier.notify((index + 1) as f64 / steps.len() as f64, step);
            }
        }
        self.pause().await;
        Ok(match &self.scenario.migration.failure {
            Some(detail) => MigrationOutcome::Failed {
                detail: detail.clone(),
            },
            None => MigrationOutcome::Success,
        })
    }
}

#[async_trait]
impl RollbackService for ScriptedCollaborators {
    async fn restore_to_legacy(&self) -> Result<bool> {
        self.counters.restore.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.scenario.rollback_succeeds)
    }
}

#[async_trait]
impl FeatureActivator for ScriptedCollaborators {
    async fn enable_privacy_features(&self) -> Result<bool> {
        self.counters.activate.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.scenario.activation_succeeds)
    }
}
