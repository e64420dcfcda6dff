//! Bounded, append-only journal of engine activity.

use crate::domain::types::MigrationPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// A single journal entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Phase active when the entry was written; `None` outside any phase.
    pub phase: Option<MigrationPhase>,
    pub message: String,
}

/// Holds at most `ceiling` entries. When an append pushes past the ceiling,
/// the oldest entries are dropped as one batch of at least `trim_batch`.
#[derive(Debug, Clone)]
pub struct MigrationLogBuffer {
    entries: VecDeque<MigrationLogEntry>,
    ceiling: usize,
    trim_batch: usize,
}

impl MigrationLogBuffer {
    pub fn new(ceiling: usize, trim_batch: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            entries: VecDeque::with_capacity(ceiling.min(1024)),
            ceiling,
            trim_batch: trim_batch.clamp(1, ceiling),
        }
    }

    /// Appends an entry and returns how many old entries were dropped.
    pub fn append(
        &mut self,
        level: LogLevel,
        phase: Option<MigrationPhase>,
        message: impl Into<String>,
    ) -> usize {
        self.entries.push_back(MigrationLogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            phase,
            message: message.into(),
        });

        if self.entries.len() <= self.ceiling {
            return 0;
        }
        let overflow = self.entries.len() - self.ceiling;
        let drop_count = self.trim_batch.max(overflow).min(self.entries.len());
        self.entries.drain(..drop_count);
        drop_count
    }

    /// Returns up to `count` of the newest entries, oldest first.
    pub fn recent(&self, count: usize) -> Vec<MigrationLogEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &MigrationLogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&MigrationLogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn trim_batch(&self) -> usize {
        self.trim_batch
    }
}

#[cfg(test)]
#[path = "tests/log_buffer_tests.rs"]
mod tests;
