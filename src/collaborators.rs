//! External collaborators the orchestrator drives.
//!
//! The engine treats every collaborator as a black box: it awaits each call
//! and inspects only the returned verdict. Transport-level failures come back
//! as `anyhow::Error` and are converted into the calling phase's
//! `MigrationExecutionError` at the phase boundary.

use crate::domain::{MigrationAssessment, ValidationSummary};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Inspects the legacy store and runs the validation battery.
#[async_trait]
pub trait AssessmentService: Send + Sync {
    /// Eligibility of the legacy store. Must be idempotent and side-effect-free.
    async fn assess_readiness(&self) -> Result<MigrationAssessment>;

    /// Runs every check against whichever store is authoritative. Never mutates data.
    async fn validate_all(&self) -> Result<ValidationSummary>;
}

/// Sets up target-side infrastructure. Idempotent and non-destructive.
#[async_trait]
pub trait PreparationService: Send + Sync {
    async fn prepare_target(&self) -> Result<()>;
}

/// Takes a restorable snapshot of the legacy store, one segment at a time.
#[async_trait]
pub trait BackupService: Send + Sync {
    /// Logical data segments to back up, in order.
    async fn data_segments(&self) -> Result<Vec<String>>;

    async fn backup_segment(&self, segment: &str) -> Result<()>;
}

/// Verdict of the irreversible transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MigrationOutcome {
    Success,
    Failed { detail: String },
}

/// Performs the legacy-to-target transform.
///
/// Implementations may publish incremental progress through a
/// `ProgressNotifier` handed to them at construction.
#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    async fn execute_migration(&self) -> Result<MigrationOutcome>;
}

/// Restores the legacy store from the backup.
#[async_trait]
pub trait RollbackService: Send + Sync {
    async fn restore_to_legacy(&self) -> Result<bool>;
}

/// Turns on the privacy-first capabilities once data is in place.
#[async_trait]
pub trait FeatureActivator: Send + Sync {
    async fn enable_privacy_features(&self) -> Result<bool>;
}

/// Collaborators injected into the engine at construction.
#[derive(Clone)]
pub struct MigrationServices {
    pub assessment: Arc<dyn AssessmentService>,
    pub preparation: Arc<dyn PreparationService>,
    pub backup: Arc<dyn BackupService>,
    pub executor: Arc<dyn MigrationExecutor>,
    pub rollback: Arc<dyn RollbackService>,
    pub activator: Arc<dyn FeatureActivator>,
}

impl MigrationServices {
    /// Uses one object for every collaborator role.
    pub fn from_single<T>(collaborator: Arc<T>) -> Self
    where
        T: AssessmentService
            + PreparationService
            + BackupService
            + MigrationExecutor
            + RollbackService
            + FeatureActivator
            + 'static,
    {
        Self {
            assessment: collaborator.clone(),
            preparation: collaborator.clone(),
            backup: collaborator.clone(),
            executor: collaborator.clone(),
            rollback: collaborator.clone(),
            activator: collaborator,
        }
    }
}
