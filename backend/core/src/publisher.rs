use std::sync::Arc;

use crate::error::ProgressError;
use crate::event::{ProgressEvent, ProgressStatus};
use crate::store::ProgressLog;

/// Highest value accepted for `completed_pct`.
pub const MAX_COMPLETED_PCT: u8 = 100;

/// The single write path into a [`ProgressLog`].
///
/// Owned by the long-running operation that drives a session. Every session
/// started here must end in exactly one call to [`finish`](Self::finish) or
/// [`fail`](Self::fail); a second terminal call fails with `SessionClosed`.
#[derive(Clone)]
pub struct Publisher {
    log: Arc<dyn ProgressLog>,
}

impl Publisher {
    pub fn new(log: Arc<dyn ProgressLog>) -> Self {
        Self { log }
    }

    /// Create the session and append its `initiated` event at 0%.
    pub fn start(&self, session_id: &str) -> Result<ProgressEvent, ProgressError> {
        self.log.create_session(session_id);
        self.log
            .append(session_id, ProgressStatus::Initiated, "Research initiated", 0)
    }

    /// Like [`start`](Self::start), but fails with `SessionExists` when the id is already taken.
    pub fn start_new(&self, session_id: &str) -> Result<ProgressEvent, ProgressError> {
        self.log.create_exclusive(session_id)?;
        self.log
            .append(session_id, ProgressStatus::Initiated, "Research initiated", 0)
    }

    /// Append a non-terminal progress event.
    pub fn report(
        &self,
        session_id: &str,
        status: ProgressStatus,
        message: &str,
        completed_pct: u8,
    ) -> Result<ProgressEvent, ProgressError> {
        if status.is_terminal() {
            return Err(ProgressError::InvalidEvent(format!(
                "status '{status}' is terminal; use finish or fail"
            )));
        }
        validate_message(message)?;
        validate_pct(completed_pct)?;
        self.log.append(session_id, status, message, completed_pct)
    }

    /// Close the session successfully at 100%.
    pub fn finish(&self, session_id: &str, message: &str) -> Result<ProgressEvent, ProgressError> {
        validate_message(message)?;
        self.log.append(
            session_id,
            ProgressStatus::Completed,
            message,
            MAX_COMPLETED_PCT,
        )
    }

    /// Close the session with an error, keeping the last reported percentage.
    pub fn fail(&self, session_id: &str, message: &str) -> Result<ProgressEvent, ProgressError> {
        validate_message(message)?;
        // 0 is clamped up to the session's current maximum by the log.
        self.log.append(session_id, ProgressStatus::Error, message, 0)
    }
}

fn validate_message(message: &str) -> Result<(), ProgressError> {
    if message.trim().is_empty() {
        return Err(ProgressError::InvalidEvent("message must not be empty".into()));
    }
    Ok(())
}

fn validate_pct(completed_pct: u8) -> Result<(), ProgressError> {
    if completed_pct > MAX_COMPLETED_PCT {
        return Err(ProgressError::InvalidEvent(format!(
            "completedPct {completed_pct} is out of range 0-100"
        )));
    }
    Ok(())
}
