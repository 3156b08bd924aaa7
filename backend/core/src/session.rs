use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{ProgressEvent, ProgressStatus};

/// Snapshot of a session record held by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSession {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_sequence: u64,
    pub terminal_event: Option<ProgressEvent>,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Completed,
    Failed,
}

impl ProgressSession {
    pub(crate) fn new(session_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at,
            last_sequence: 0,
            terminal_event: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.terminal_event.as_ref().map(|e| e.status) {
            None => SessionState::Open,
            Some(ProgressStatus::Error) => SessionState::Failed,
            Some(_) => SessionState::Completed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.terminal_event.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_open() {
        let session = ProgressSession::new("s1", Utc::now());
        assert_eq!(session.last_sequence, 0);
        assert_eq!(session.state(), SessionState::Open);
        assert!(!session.is_closed());
    }

    #[test]
    fn test_state_follows_terminal_event() {
        let mut session = ProgressSession::new("s1", Utc::now());
        session.terminal_event = Some(ProgressEvent::new(
            "s1",
            2,
            ProgressStatus::Error,
            "boom",
            40,
            Utc::now(),
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.is_closed());
    }
}
