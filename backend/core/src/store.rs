use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::error::ProgressError;
use crate::event::{ProgressEvent, ProgressStatus};
use crate::session::ProgressSession;

/// Default capacity of the append notification channel.
const DEFAULT_NOTIFY_CAPACITY: usize = 1024;

/// Append-only, session-scoped progress log.
///
/// Publisher and Subscriber only talk to this trait, so an external ordered
/// log can stand in for the in-memory [`EventStore`] without touching them.
pub trait ProgressLog: Send + Sync {
    /// Create the session, or return the existing one unchanged.
    fn create_session(&self, session_id: &str) -> ProgressSession;

    /// Create the session, failing with `SessionExists` if the id is taken.
    fn create_exclusive(&self, session_id: &str) -> Result<ProgressSession, ProgressError>;

    /// Append an event; the log assigns sequence and timestamp.
    fn append(
        &self,
        session_id: &str,
        status: ProgressStatus,
        message: &str,
        completed_pct: u8,
    ) -> Result<ProgressEvent, ProgressError>;

    /// All events with `sequence > after_sequence`, ascending.
    fn read_since(
        &self,
        session_id: &str,
        after_sequence: u64,
    ) -> Result<Vec<ProgressEvent>, ProgressError>;

    /// Whether the session has its terminal event.
    fn is_terminal(&self, session_id: &str) -> Result<bool, ProgressError>;

    /// Snapshot of the session record.
    fn session(&self, session_id: &str) -> Result<ProgressSession, ProgressError>;
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct SessionLog {
    session: ProgressSession,
    events: Vec<ProgressEvent>,
    max_pct: u8,
    last_activity: DateTime<Utc>,
}

impl SessionLog {
    fn new(session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            session: ProgressSession::new(session_id, now),
            events: Vec::new(),
            max_pct: 0,
            last_activity: now,
        }
    }
}

/// In-memory [`ProgressLog`], scoped to the lifetime of the value.
///
/// The session map is behind an `RwLock` that is only held for lookup and
/// insertion; each session has its own `Mutex`, so sequence assignment is
/// atomic per session while readers of other sessions proceed.
pub struct EventStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionLog>>>>,
    notify_tx: broadcast::Sender<ProgressEvent>,
    clock: Clock,
}

impl EventStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Create a store reading time from `clock` instead of the system clock.
    pub fn with_clock(clock: Clock) -> Self {
        let (notify_tx, _) = broadcast::channel(DEFAULT_NOTIFY_CAPACITY);
        Self {
            sessions: RwLock::new(HashMap::new()),
            notify_tx,
            clock,
        }
    }

    /// Receive a copy of every event after it has been stored.
    ///
    /// This is a wake-up signal for push consumers; the log itself stays the
    /// source of truth and a lagging receiver should re-read with `read_since`.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.notify_tx.subscribe()
    }

    /// Remove sessions with no activity since `cutoff`. Returns how many were removed.
    pub fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, log| {
            let last_activity = lock(log).last_activity;
            last_activity >= cutoff
        });
        before - sessions.len()
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, session_id: &str) -> Result<Arc<Mutex<SessionLog>>, ProgressError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .ok_or_else(|| ProgressError::SessionNotFound(session_id.to_string()))
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(log: &Mutex<SessionLog>) -> MutexGuard<'_, SessionLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProgressLog for EventStore {
    fn create_session(&self, session_id: &str) -> ProgressSession {
        if let Ok(existing) = self.get(session_id) {
            return lock(&existing).session.clone();
        }
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let log = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SessionLog::new(session_id, (self.clock)()))));
        let session = lock(log).session.clone();
        session
    }

    fn create_exclusive(&self, session_id: &str) -> Result<ProgressSession, ProgressError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(session_id) {
            return Err(ProgressError::SessionExists(session_id.to_string()));
        }
        let log = SessionLog::new(session_id, (self.clock)());
        let session = log.session.clone();
        sessions.insert(session_id.to_string(), Arc::new(Mutex::new(log)));
        Ok(session)
    }

    fn append(
        &self,
        session_id: &str,
        status: ProgressStatus,
        message: &str,
        completed_pct: u8,
    ) -> Result<ProgressEvent, ProgressError> {
        let log = self.get(session_id)?;
        let mut log = lock(&log);

        if log.session.is_closed() {
            return Err(ProgressError::SessionClosed(session_id.to_string()));
        }

        let mut timestamp = (self.clock)();
        if let Some(previous) = log.events.last() {
            timestamp = timestamp.max(previous.timestamp);
        }
        let completed_pct = completed_pct.max(log.max_pct);
        let sequence = log.session.last_sequence + 1;

        let event = ProgressEvent::new(
            session_id,
            sequence,
            status,
            message,
            completed_pct,
            timestamp,
        );

        log.events.push(event.clone());
        log.session.last_sequence = sequence;
        log.max_pct = completed_pct;
        log.last_activity = timestamp;
        if status.is_terminal() {
            log.session.terminal_event = Some(event.clone());
        }

        // Sent under the session lock so receivers see per-session sequence order.
        let _ = self.notify_tx.send(event.clone());

        Ok(event)
    }

    fn read_since(
        &self,
        session_id: &str,
        after_sequence: u64,
    ) -> Result<Vec<ProgressEvent>, ProgressError> {
        let log = self.get(session_id)?;
        let log = lock(&log);
        // events[i] has sequence i + 1
        let start = usize::try_from(after_sequence).unwrap_or(usize::MAX);
        Ok(log.events.get(start..).map(<[_]>::to_vec).unwrap_or_default())
    }

    fn is_terminal(&self, session_id: &str) -> Result<bool, ProgressError> {
        let log = self.get(session_id)?;
        let closed = lock(&log).session.is_closed();
        Ok(closed)
    }

    fn session(&self, session_id: &str) -> Result<ProgressSession, ProgressError> {
        let log = self.get(session_id)?;
        let session = lock(&log).session.clone();
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::thread;

    #[test]
    fn test_create_session_is_idempotent() {
        let store = EventStore::new();
        let first = store.create_session("s1");
        store.append("s1", ProgressStatus::Initiated, "Started", 0).unwrap();
        store.append("s1", ProgressStatus::Searching, "Searching", 10).unwrap();

        let second = store.create_session("s1");
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.last_sequence, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_exclusive_rejects_existing() {
        let store = EventStore::new();
        store.create_exclusive("s1").unwrap();
        assert_eq!(
            store.create_exclusive("s1"),
            Err(ProgressError::SessionExists("s1".into()))
        );
    }

    #[test]
    fn test_append_assigns_gapless_sequences() {
        let store = EventStore::new();
        store.create_session("s1");
        for i in 0..5u8 {
            store
                .append("s1", ProgressStatus::Searching, "step", i * 10)
                .unwrap();
        }
        let events = store.read_since("s1", 0).unwrap();
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_append_to_unknown_session() {
        let store = EventStore::new();
        let err = store
            .append("nope", ProgressStatus::Searching, "x", 1)
            .unwrap_err();
        assert_eq!(err, ProgressError::SessionNotFound("nope".into()));
    }

    #[test]
    fn test_append_after_terminal_fails() {
        let store = EventStore::new();
        store.create_session("s1");
        store.append("s1", ProgressStatus::Completed, "Done", 100).unwrap();

        let err = store
            .append("s1", ProgressStatus::Searching, "late", 100)
            .unwrap_err();
        assert_eq!(err, ProgressError::SessionClosed("s1".into()));
        assert!(store.is_terminal("s1").unwrap());
        assert_eq!(store.read_since("s1", 0).unwrap().len(), 1);
    }

    #[test]
    fn test_terminal_event_recorded() {
        let store = EventStore::new();
        store.create_session("s1");
        store.append("s1", ProgressStatus::Initiated, "Started", 0).unwrap();
        let terminal = store.append("s1", ProgressStatus::Error, "boom", 0).unwrap();

        let session = store.session("s1").unwrap();
        assert_eq!(session.terminal_event, Some(terminal));
        assert_eq!(session.last_sequence, 2);
    }

    #[test]
    fn test_completed_pct_is_clamped() {
        let store = EventStore::new();
        store.create_session("s1");
        store.append("s1", ProgressStatus::Searching, "msg", 30).unwrap();
        let second = store.append("s1", ProgressStatus::Searching, "msg2", 20).unwrap();
        assert_eq!(second.completed_pct, 30);

        let pcts: Vec<u8> = store
            .read_since("s1", 0)
            .unwrap()
            .iter()
            .map(|e| e.completed_pct)
            .collect();
        assert!(pcts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_timestamp_never_goes_backwards() {
        let base = Utc::now();
        let offset = Arc::new(AtomicI64::new(0));
        let clock_offset = Arc::clone(&offset);
        let store = EventStore::with_clock(Arc::new(move || {
            base + Duration::seconds(clock_offset.load(Ordering::SeqCst))
        }));

        store.create_session("s1");
        offset.store(10, Ordering::SeqCst);
        let first = store.append("s1", ProgressStatus::Searching, "a", 10).unwrap();
        // clock steps back
        offset.store(5, Ordering::SeqCst);
        let second = store.append("s1", ProgressStatus::Searching, "b", 20).unwrap();

        assert_eq!(second.timestamp, first.timestamp);
    }

    #[test]
    fn test_read_since_excludes_seen_events() {
        let store = EventStore::new();
        store.create_session("s1");
        for _ in 0..4 {
            store.append("s1", ProgressStatus::Searching, "step", 0).unwrap();
        }
        for after in 0..6u64 {
            let events = store.read_since("s1", after).unwrap();
            assert!(events.iter().all(|e| e.sequence > after));
            assert_eq!(events.len() as u64, 4u64.saturating_sub(after));
        }
    }

    #[test]
    fn test_read_since_unknown_session() {
        let store = EventStore::new();
        assert_eq!(
            store.read_since("unknown-session", 0),
            Err(ProgressError::SessionNotFound("unknown-session".into()))
        );
        assert!(store.is_terminal("unknown-session").is_err());
    }

    #[test]
    fn test_read_since_empty_session() {
        let store = EventStore::new();
        store.create_session("s1");
        assert!(store.read_since("s1", 0).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_appends_get_unique_sequences() {
        let store = Arc::new(EventStore::new());
        store.create_session("s1");

        thread::scope(|scope| {
            for _ in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for _ in 0..50 {
                        store
                            .append("s1", ProgressStatus::Searching, "tick", 10)
                            .unwrap();
                    }
                });
            }
        });

        let events = store.read_since("s1", 0).unwrap();
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        let expected: Vec<u64> = (1..=400).collect();
        assert_eq!(sequences, expected);
        assert_eq!(store.session("s1").unwrap().last_sequence, 400);
    }

    #[test]
    fn test_evict_idle() {
        let base = Utc::now();
        let offset = Arc::new(AtomicI64::new(0));
        let clock_offset = Arc::clone(&offset);
        let store = EventStore::with_clock(Arc::new(move || {
            base + Duration::seconds(clock_offset.load(Ordering::SeqCst))
        }));

        store.create_session("old");
        offset.store(100, Ordering::SeqCst);
        store.create_session("new");

        let removed = store.evict_idle(base + Duration::seconds(50));
        assert_eq!(removed, 1);
        assert!(store.session("old").is_err());
        assert!(store.session("new").is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_receives_appends_in_order() {
        let store = EventStore::new();
        let mut rx = store.subscribe();
        store.create_session("s1");
        store.append("s1", ProgressStatus::Initiated, "Started", 0).unwrap();
        store.append("s1", ProgressStatus::Completed, "Done", 100).unwrap();

        assert_eq!(rx.recv().await.unwrap().sequence, 1);
        let last = rx.recv().await.unwrap();
        assert_eq!(last.sequence, 2);
        assert!(last.is_terminal);
    }
}
