//! Domain model for the staged data migration.
//!
//! - **Types** (`types.rs`): lifecycle states, phases, phase descriptor table
//! - **Assessment** (`assessment.rs`): eligibility verdicts and validation batteries
//! - **Errors** (`errors.rs`): per-phase failures and call-ordering rejections
//! - **Log buffer** (`log_buffer.rs`): bounded journal surfaced to the UI
//! - **Summary** (`summary.rs`): read-only display projection

pub mod assessment;
pub mod errors;
pub mod log_buffer;
pub mod summary;
pub mod types;

pub use assessment::{MigrationAssessment, ValidationResult, ValidationStatus, ValidationSummary};
pub use errors::{EngineError, MigrationExecutionError};
pub use log_buffer::{LogLevel, MigrationLogBuffer, MigrationLogEntry};
pub use summary::{format_duration, MigrationSummary};
pub use types::{MigrationPhase, MigrationState, PhaseDescriptor, PHASE_TABLE};
