use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// One immutable entry in a session's progress log.
///
/// `sequence` and `timestamp` are assigned by the store at append time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub session_id: String,
    pub sequence: u64,
    pub status: ProgressStatus,
    pub message: String,
    pub completed_pct: u8,
    pub timestamp: DateTime<Utc>,
    pub is_terminal: bool,
}

impl ProgressEvent {
    pub(crate) fn new(
        session_id: impl Into<String>,
        sequence: u64,
        status: ProgressStatus,
        message: impl Into<String>,
        completed_pct: u8,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            sequence,
            status,
            message: message.into(),
            completed_pct,
            timestamp,
            is_terminal: status.is_terminal(),
        }
    }
}

/// Stage of a research request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// The session was opened
    Initiated,
    /// Queries are being sent to a search provider
    Searching,
    /// Results are being fetched, or a fallback provider is being tried
    Retrieving,
    /// The answer is being assembled
    Synthesizing,
    /// Terminal: the answer is ready
    Completed,
    /// Terminal: the request failed
    Error,
}

impl ProgressStatus {
    pub const ALL: [ProgressStatus; 6] = [
        ProgressStatus::Initiated,
        ProgressStatus::Searching,
        ProgressStatus::Retrieving,
        ProgressStatus::Synthesizing,
        ProgressStatus::Completed,
        ProgressStatus::Error,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::Initiated => "initiated",
            ProgressStatus::Searching => "searching",
            ProgressStatus::Retrieving => "retrieving",
            ProgressStatus::Synthesizing => "synthesizing",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProgressStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ProgressError::InvalidEvent(format!("unknown status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(ProgressStatus::Completed.is_terminal());
        assert!(ProgressStatus::Error.is_terminal());
        assert!(!ProgressStatus::Initiated.is_terminal());
        assert!(!ProgressStatus::Synthesizing.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("searching".parse::<ProgressStatus>(), Ok(ProgressStatus::Searching));
        let err = "thinking".parse::<ProgressStatus>().unwrap_err();
        assert!(matches!(err, ProgressError::InvalidEvent(_)));
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in ProgressStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str().unwrap(), status.to_string());
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = ProgressEvent::new(
            "s1",
            1,
            ProgressStatus::Completed,
            "Done",
            100,
            Utc::now(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["completedPct"], 100);
        assert_eq!(json["isTerminal"], true);
        assert_eq!(json["status"], "completed");
    }
}
