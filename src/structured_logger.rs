//! Structured JSONL audit log for directive authoring.
//!
//! Each line carries:
//! - A monotonic sequence number for ordering
//! - An ISO 8601 timestamp with microsecond precision
//! - The session ID of the process that wrote it
//! - Structured event data in JSON format

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::{DirectiveNotification, WorkflowCommand};

/// Structured JSONL logger for commands and notifications.
pub struct StructuredLogger {
    session_id: String,
    seq: AtomicU64,
    log_file: Mutex<File>,
    log_path: PathBuf,
}

/// A single log entry in JSONL format.
#[derive(Serialize, serde::Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number (unique within a session)
    pub seq: u64,
    /// ISO 8601 timestamp with microseconds
    pub ts: String,
    pub session_id: String,
    /// Component that emitted the log
    pub component: String,
    pub event: Value,
}

impl StructuredLogger {
    /// Opens `<logs_dir>/events.jsonl` for appending.
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
            seq: AtomicU64::new(0),
            log_file: Mutex::new(file),
            log_path,
        })
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Logs a structured event as a single line. Thread-safe.
    pub fn log(&self, component: &str, event: impl Serialize) {
        let entry = LogEntry {
            seq: self.next_seq(),
            ts: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            session_id: self.session_id.clone(),
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

    /// Logs a command about to be dispatched to a directive.
    pub fn log_command(&self, directive_id: &str, command: &WorkflowCommand) {
        self.log(
            "Authoring",
            serde_json::json!({
                "type": "WorkflowCommand",
                "directive_id": directive_id,
                "command": command
            }),
        );
    }

    /// Logs a command the aggregate or store rejected.
    pub fn log_command_failed(&self, directive_id: &str, command: &str, error: &str) {
        self.log(
            "Authoring",
            serde_json::json!({
                "type": "CommandFailed",
                "directive_id": directive_id,
                "command": command,
                "error": error
            }),
        );
    }

    /// Logs a domain notification from a committed event.
    pub fn log_notification(&self, notification: &DirectiveNotification) {
        self.log(
            "Directive",
            serde_json::json!({
                "type": "DirectiveNotification",
                "notification": notification
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
