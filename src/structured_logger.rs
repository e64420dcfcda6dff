//! Structured JSONL logger for debugging and run reconstruction.
//!
//! This module provides machine-parseable logging with:
//! - Monotonic sequence numbers for ordering
//! - ISO 8601 timestamps with microsecond precision
//! - Session and run IDs for correlation
//! - Every state-machine command and event in JSON format

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::state_machine::{StateCommand, StateEvent};

/// Structured JSONL logger for debugging and run reconstruction.
pub struct StructuredLogger {
    session_id: String,
    run_id: AtomicU64,
    seq: AtomicU64,
    log_file: Mutex<File>,
    log_path: PathBuf,
}

/// A single log entry in JSONL format.
#[derive(Serialize, serde::Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number (unique across entire session)
    pub seq: u64,
    /// ISO 8601 timestamp with microseconds
    pub ts: String,
    pub session_id: String,
    /// Run ID (increments on every engine reset)
    pub run_id: u64,
    /// Component that emitted the log
    pub component: String,
    /// Structured event data
    pub event: Value,
}

impl StructuredLogger {
    /// Creates a new structured logger for the given session.
    ///
    /// Logs are written to `<logs_dir>/events.jsonl`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The logs directory cannot be created
    /// - The log file cannot be opened
    pub fn new(session_id: &str, logs_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(logs_dir)?;
        let log_path = logs_dir.join("events.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            session_id: session_id.to_string(),
            run_id: AtomicU64::new(1),
            seq: AtomicU64::new(0),
            log_file: Mutex::new(file),
            log_path,
        })
    }

    /// Increments the run ID (called when the engine resets).
    pub fn increment_run_id(&self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Logs a structured event.
    ///
    /// The event is serialized to JSON and written as a single line.
    /// Write failures are ignored; this method is thread-safe.
    pub fn log(&self, component: &str, event: impl Serialize) {
        let entry = LogEntry {
            seq: self.next_seq(),
            ts: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            session_id: self.session_id.clone(),
            run_id: self.run_id.load(Ordering::SeqCst),
            component: component.to_string(),
            event: serde_json::to_value(event).unwrap_or(Value::Null),
        };

        if let Ok(mut file) = self.log_file.lock() {
            if let Ok(line) = serde_json::to_string(&entry) {
                let _ = writeln!(file, "{}", line);
                let _ = file.flush();
            }
        }
    }

    /// Logs a state-machine command with the machine's own sequence number.
    pub fn log_command(&self, machine_seq: u64, command: &StateCommand) {
        self.log(
            "StateMachine",
            serde_json::json!({
                "type": "Command",
                "machine_seq": machine_seq,
                "command": command
            }),
        );
    }

    /// Logs an event emitted while applying a command.
    pub fn log_event(&self, machine_seq: u64, event: &StateEvent) {
        self.log(
            "StateMachine",
            serde_json::json!({
                "type": "Event",
                "machine_seq": machine_seq,
                "event": event
            }),
        );
    }

    /// Logs a control-surface request received by the engine.
    pub fn log_request(&self, request: &str) {
        self.log(
            "Engine",
            serde_json::json!({
                "type": "Request",
                "request": request
            }),
        );
    }

    /// Logs a rejected control-surface request.
    pub fn log_rejection(&self, request: &str, reason: &str) {
        self.log(
            "Engine",
            serde_json::json!({
                "type": "Rejected",
                "request": request,
                "reason": reason
            }),
        );
    }

    /// Logs a progress notification received from a collaborator.
    pub fn log_notification(&self, progress: f64, step: &str, applied: bool) {
        self.log(
            "Notification",
            serde_json::json!({
                "type": "Progress",
                "progress": progress,
                "step": step,
                "applied": applied
            }),
        );
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
#[path = "tests/structured_logger_tests.rs"]
mod tests;
