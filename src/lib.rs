pub mod app;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod engine;
pub mod notifications;
pub mod paths;
pub mod phases;
pub mod scripted;
pub mod state_machine;
pub mod structured_logger;

pub use config::MigrationConfig;
pub use domain::{
    EngineError, MigrationExecutionError, MigrationPhase, MigrationState, MigrationSummary,
};
pub use engine::{CancelOutcome, MigrationEngine, MigrationHandle};
