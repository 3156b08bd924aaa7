//! Telemetry and structured logging for Sports GPT.
//!
//! Console + rolling NDJSON output, secret redaction, and the research audit trail.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AuditLogEntry, ResearchAuditEvent, ResearchAuditLog};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
