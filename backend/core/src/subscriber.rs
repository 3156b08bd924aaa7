use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ProgressError;
use crate::event::ProgressEvent;
use crate::store::ProgressLog;

/// An observer's position in a session's log: the highest sequence consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub session_id: String,
    pub sequence: u64,
}

impl Cursor {
    /// Resume from a sequence the client already holds (e.g. after a reload).
    pub fn at(session_id: impl Into<String>, sequence: u64) -> Self {
        Self {
            session_id: session_id.into(),
            sequence,
        }
    }
}

/// Pull-based read path over a [`ProgressLog`].
///
/// Holds no per-observer state; each observer keeps its own [`Cursor`], so any
/// number of observers can poll the same session independently.
#[derive(Clone)]
pub struct Subscriber {
    log: Arc<dyn ProgressLog>,
}

impl Subscriber {
    pub fn new(log: Arc<dyn ProgressLog>) -> Self {
        Self { log }
    }

    pub fn open(&self, session_id: impl Into<String>) -> Cursor {
        Cursor::at(session_id, 0)
    }

    /// Fetch events newer than `cursor`, returning them with the advanced cursor.
    pub fn poll(&self, cursor: &Cursor) -> Result<(Vec<ProgressEvent>, Cursor), ProgressError> {
        let events = self.log.read_since(&cursor.session_id, cursor.sequence)?;
        let sequence = events.last().map_or(cursor.sequence, |e| e.sequence);
        Ok((events, Cursor::at(cursor.session_id.clone(), sequence)))
    }

    pub fn is_done(&self, session_id: &str) -> Result<bool, ProgressError> {
        self.log.is_terminal(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ProgressStatus;
    use crate::publisher::Publisher;
    use crate::store::EventStore;

    fn setup() -> (Publisher, Subscriber) {
        let store: Arc<dyn ProgressLog> = Arc::new(EventStore::new());
        (Publisher::new(store.clone()), Subscriber::new(store))
    }

    fn run_to_completion(publisher: &Publisher, session_id: &str) {
        publisher.start(session_id).unwrap();
        publisher
            .report(session_id, ProgressStatus::Searching, "Looking up stats", 40)
            .unwrap();
        publisher
            .report(session_id, ProgressStatus::Synthesizing, "Compiling answer", 80)
            .unwrap();
        publisher.finish(session_id, "Done").unwrap();
    }

    #[test]
    fn test_poll_advances_cursor() {
        let (publisher, subscriber) = setup();
        publisher.start("s1").unwrap();

        let cursor = subscriber.open("s1");
        let (events, cursor) = subscriber.poll(&cursor).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(cursor.sequence, 1);

        let (events, same) = subscriber.poll(&cursor).unwrap();
        assert!(events.is_empty());
        assert_eq!(same, cursor);

        publisher
            .report("s1", ProgressStatus::Searching, "Searching", 25)
            .unwrap();
        let (events, cursor) = subscriber.poll(&cursor).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, 2);
        assert_eq!(cursor.sequence, 2);
    }

    #[test]
    fn test_independent_observers_see_identical_streams() {
        let (publisher, subscriber) = setup();
        run_to_completion(&publisher, "s1");

        let first = subscriber.open("s1");
        let second = subscriber.open("s1");
        let (a, first) = subscriber.poll(&first).unwrap();
        let (b, second) = subscriber.poll(&second).unwrap();

        assert_eq!(a.len(), 4);
        assert_eq!(a, b);
        assert_eq!(first.sequence, 4);
        assert_eq!(second.sequence, 4);
        assert!(subscriber.is_done("s1").unwrap());
    }

    #[test]
    fn test_reconnect_resumes_without_duplicates() {
        let (publisher, subscriber) = setup();
        publisher.start("s1").unwrap();
        publisher
            .report("s1", ProgressStatus::Searching, "Searching", 20)
            .unwrap();

        let (seen, cursor) = subscriber.poll(&subscriber.open("s1")).unwrap();
        // observer goes away; only the sequence number survives
        let held = cursor.sequence;

        publisher
            .report("s1", ProgressStatus::Synthesizing, "Writing", 80)
            .unwrap();
        publisher.finish("s1", "Done").unwrap();

        let (rest, cursor) = subscriber.poll(&Cursor::at("s1", held)).unwrap();
        let all: Vec<u64> = seen.iter().chain(rest.iter()).map(|e| e.sequence).collect();
        assert_eq!(all, vec![1, 2, 3, 4]);
        assert_eq!(cursor.sequence, 4);
        assert!(rest.last().unwrap().is_terminal);
    }

    #[test]
    fn test_unknown_session_is_an_error() {
        let (_publisher, subscriber) = setup();
        let cursor = subscriber.open("unknown-session");
        assert_eq!(
            subscriber.poll(&cursor),
            Err(ProgressError::SessionNotFound("unknown-session".into()))
        );
        assert!(subscriber.is_done("unknown-session").is_err());
    }

    #[tokio::test]
    async fn test_concurrent_pollers_during_publication() {
        let (publisher, subscriber) = setup();
        publisher.start("s1").unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let subscriber = subscriber.clone();
            handles.push(tokio::spawn(async move {
                let mut cursor = subscriber.open("s1");
                let mut seen = Vec::new();
                loop {
                    let (events, next) = subscriber.poll(&cursor).unwrap();
                    seen.extend(events.iter().map(|e| e.sequence));
                    cursor = next;
                    if subscriber.is_done("s1").unwrap() && events.is_empty() {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        for pct in (10..=90).step_by(10) {
            publisher
                .report("s1", ProgressStatus::Searching, "tick", pct)
                .unwrap();
            tokio::task::yield_now().await;
        }
        publisher.finish("s1", "Done").unwrap();

        let expected: Vec<u64> = (1..=11).collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), expected);
        }
    }
}
