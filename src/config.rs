use crate::domain::MigrationPhase;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MigrationConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    /// Per-phase timeouts. A phase without one can block the pipeline forever.
    #[serde(default)]
    pub timeouts: PhaseTimeouts,
}

/// Bounds for the in-memory log buffer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Maximum entries held. Default: 1000
    #[serde(default = "default_log_ceiling")]
    pub ceiling: usize,
    /// Oldest entries dropped in one trim once the ceiling is exceeded. Default: 100
    #[serde(default = "default_trim_batch")]
    pub trim_batch: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            ceiling: default_log_ceiling(),
            trim_batch: default_trim_batch(),
        }
    }
}

fn default_log_ceiling() -> usize {
    1000
}

fn default_trim_batch() -> usize {
    100
}

/// How much recent history `summary()` includes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummaryConfig {
    #[serde(default = "default_recent_log_entries")]
    pub recent_log_entries: usize,
    #[serde(default = "default_recent_validation_results")]
    pub recent_validation_results: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            recent_log_entries: default_recent_log_entries(),
            recent_validation_results: default_recent_validation_results(),
        }
    }
}

fn default_recent_log_entries() -> usize {
    20
}

fn default_recent_validation_results() -> usize {
    10
}

/// Timeouts in seconds, keyed by phase.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseTimeouts {
    #[serde(default)]
    pub assessment: Option<u64>,
    #[serde(default)]
    pub preparation: Option<u64>,
    #[serde(default)]
    pub backup: Option<u64>,
    #[serde(default)]
    pub migration: Option<u64>,
    #[serde(default)]
    pub validation: Option<u64>,
    #[serde(default)]
    pub completion: Option<u64>,
    #[serde(default)]
    pub rollback: Option<u64>,
}

impl PhaseTimeouts {
    fn seconds_for(&self, phase: MigrationPhase) -> Option<u64> {
        match phase {
            MigrationPhase::Assessment => self.assessment,
            MigrationPhase::Preparation => self.preparation,
            MigrationPhase::Backup => self.backup,
            MigrationPhase::Migration => self.migration,
            MigrationPhase::Validation => self.validation,
            MigrationPhase::Completion => self.completion,
            MigrationPhase::Rollback => self.rollback,
        }
    }

    pub fn timeout_for(&self, phase: MigrationPhase) -> Option<Duration> {
        self.seconds_for(phase).map(Duration::from_secs)
    }

    pub fn set(&mut self, phase: MigrationPhase, seconds: Option<u64>) {
        let slot = match phase {
            MigrationPhase::Assessment => &mut self.assessment,
            MigrationPhase::Preparation => &mut self.preparation,
            MigrationPhase::Backup => &mut self.backup,
            MigrationPhase::Migration => &mut self.migration,
            MigrationPhase::Validation => &mut self.validation,
            MigrationPhase::Completion => &mut self.completion,
            MigrationPhase::Rollback => &mut self.rollback,
        };
        *slot = seconds;
    }
}

impl MigrationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        const DEFAULT_MIGRATION_YAML: &str = include_str!("../migration.yaml");

        serde_yaml::from_str(DEFAULT_MIGRATION_YAML)
            .expect("Failed to parse embedded migration.yaml - this is a bug in the migration.yaml file")
    }

    pub fn validate(&self) -> Result<()> {
        if self.log.ceiling == 0 {
            anyhow::bail!("log.ceiling must be at least 1");
        }
        if self.log.trim_batch == 0 {
            anyhow::bail!("log.trim_batch must be at least 1");
        }
        if self.log.trim_batch > self.log.ceiling {
            anyhow::bail!(
                "log.trim_batch ({}) cannot exceed log.ceiling ({})",
                self.log.trim_batch,
                self.log.ceiling
            );
        }

        for descriptor in crate::domain::PHASE_TABLE.iter() {
            if self.timeouts.seconds_for(descriptor.phase) == Some(0) {
                anyhow::bail!(
                    "timeout for phase '{}' must be greater than zero",
                    descriptor.name
                );
            }
        }

        Ok(())
    }
}
