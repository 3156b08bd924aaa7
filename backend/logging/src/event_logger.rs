//! Research Audit Log
//!
//! One structured record per research lifecycle step, emitted on the
//! `research_audit` tracing target so it lands in the NDJSON file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchAuditEvent {
    QueryReceived {
        query: String,
    },
    ProviderSucceeded {
        provider: String,
        latency_ms: u64,
        sources: usize,
    },
    ProviderFailed {
        provider: String,
        latency_ms: u64,
        error_msg: String,
    },
    Finished {
        processing_ms: u64,
        outcome: String,
    },
}

#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ResearchAuditEvent,
}

pub struct ResearchAuditLog;

impl ResearchAuditLog {
    /// Build the redacted entry for `event`.
    pub fn entry(session_id: &str, mut event: ResearchAuditEvent) -> AuditLogEntry {
        match &mut event {
            ResearchAuditEvent::QueryReceived { query } => {
                *query = redact_sensitive_data(query);
            }
            ResearchAuditEvent::ProviderFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            ResearchAuditEvent::ProviderSucceeded { .. } | ResearchAuditEvent::Finished { .. } => {}
        }

        AuditLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Record a research lifecycle step.
    pub fn record(session_id: &str, event: ResearchAuditEvent) {
        let entry = Self::entry(session_id, event);
        let json = serde_json::to_string(&entry.event).unwrap_or_default();
        info!(target: "research_audit", session_id = %entry.session_id, event = %json, "Research audit");
    }
}
