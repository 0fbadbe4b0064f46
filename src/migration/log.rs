//! Logging seam for the migration.
//!
//! The migrator reports progress through a [`MigrationLog`] it is handed
//! instead of a process-wide logger. [`TracingLog`] forwards to `tracing`;
//! [`RecordingLog`] keeps events in memory so tests can assert on them.

use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// One structured log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub message: String,
    pub keyspace: Option<String>,
    pub table: Option<String>,
    pub error: Option<String>,
}

impl LogEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            keyspace: None,
            table: None,
            error: None,
        }
    }

    pub fn keyspace(mut self, keyspace: &str) -> Self {
        self.keyspace = Some(keyspace.to_string());
        self
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

pub trait MigrationLog: Send + Sync {
    fn info(&self, event: LogEvent);

    fn error(&self, event: LogEvent);
}

/// Forwards events to `tracing` under the `twcs_migrate` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl MigrationLog for TracingLog {
    fn info(&self, event: LogEvent) {
        tracing::info!(
            target: "twcs_migrate",
            keyspace = event.keyspace.as_deref().unwrap_or_default(),
            table = event.table.as_deref().unwrap_or_default(),
            "{}",
            event.message
        );
    }

    fn error(&self, event: LogEvent) {
        tracing::error!(
            target: "twcs_migrate",
            keyspace = event.keyspace.as_deref().unwrap_or_default(),
            table = event.table.as_deref().unwrap_or_default(),
            error = event.error.as_deref().unwrap_or_default(),
            "{}",
            event.message
        );
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    events: Mutex<Vec<(LogLevel, LogEvent)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(LogLevel, LogEvent)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, event)| event.message)
            .collect()
    }

    pub fn errors(&self) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, event)| event)
            .collect()
    }

    fn push(&self, level: LogLevel, event: LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, event));
    }
}

impl MigrationLog for RecordingLog {
    fn info(&self, event: LogEvent) {
        self.push(LogLevel::Info, event);
    }

    fn error(&self, event: LogEvent) {
        self.push(LogLevel::Error, event);
    }
}
