//! Callback channel from a running phase back to the engine.

use crate::domain::{LogLevel, MigrationAssessment, ValidationSummary};
use tokio::sync::mpsc;

/// Messages a phase runner sends while it executes.
#[derive(Debug, Clone)]
pub enum PhaseUpdate {
    /// Phase-local progress in `[0, 1]`.
    Progress(f64),
    Detail(String),
    Log(LogLevel, String),
    Assessment(MigrationAssessment),
    Validation(ValidationSummary),
}

/// Cloneable sender a phase uses to report to the engine.
#[derive(Debug, Clone)]
pub struct PhaseReporter {
    inner: mpsc::UnboundedSender<PhaseUpdate>,
}

impl PhaseReporter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PhaseUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { inner: tx }, rx)
    }

    fn send(&self, update: PhaseUpdate) {
        let _ = self.inner.send(update);
    }

    pub fn progress(&self, local: f64) {
        self.send(PhaseUpdate::Progress(local));
    }

    /// Reports that the phase body is done. Sent right before returning `Ok`.
    pub fn finish(&self) {
        self.progress(1.0);
    }

    pub fn detail(&self, text: impl Into<String>) {
        self.send(PhaseUpdate::Detail(text.into()));
    }

    pub fn info(&self, text: impl Into<String>) {
        self.send(PhaseUpdate::Log(LogLevel::Info, text.into()));
    }

    pub fn warn(&self, text: impl Into<String>) {
        self.send(PhaseUpdate::Log(LogLevel::Warning, text.into()));
    }

    pub fn assessment(&self, assessment: MigrationAssessment) {
        self.send(PhaseUpdate::Assessment(assessment));
    }

    pub fn validation(&self, summary: ValidationSummary) {
        self.send(PhaseUpdate::Validation(summary));
    }
}
