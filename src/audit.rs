//! Audit trail for exit actions
//!
//! Recording is fire-and-forget: callers go through [`record_best_effort`],
//! which logs a failed write and carries on.

use crate::error::AuditError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What was done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    DeleteInvestor,
    ExitSeries,
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    /// Human-readable description
    pub details: String,
    /// Before/after values of everything written
    pub changes: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// Destination for audit events
pub trait AuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Record an event, logging instead of returning any failure
pub fn record_best_effort<A: AuditSink + ?Sized>(sink: &A, event: &AuditEvent) {
    match sink.record(event) {
        Ok(()) => log::debug!("Audit {:?} recorded for {} {}", event.action, event.entity_type, event.entity_id),
        Err(err) => log::warn!(
            "Audit {:?} for {} {} was not recorded: {}",
            event.action,
            event.entity_type,
            event.entity_id,
            err
        ),
    }
}

/// Appends one JSON object per line to a file
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    path: PathBuf,
}

impl JsonlAuditSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .map_err(|_| AuditError::Unavailable("audit buffer poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
