//! Server-Sent Events view of a session's progress (`GET /research/events`).
//!
//! Replays the log after `after`, then follows the store's notification
//! channel until the terminal event has been sent.

use std::collections::VecDeque;
use std::convert::Infallible;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use sportsgpt_core::{Cursor, ProgressEvent, Subscriber};

use crate::error::ApiError;
use crate::research_api::{ProgressQuery, require_session_id};
use crate::server::GatewayState;

struct Tail {
    rx: broadcast::Receiver<ProgressEvent>,
    subscriber: Subscriber,
    cursor: Cursor,
    pending: VecDeque<ProgressEvent>,
    finished: bool,
}

impl Tail {
    /// Next event for this session, or `None` once the terminal event was sent.
    async fn next(&mut self) -> Option<ProgressEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                self.cursor.sequence = event.sequence;
                self.finished = event.is_terminal;
                return Some(event);
            }
            if self.finished {
                return None;
            }
            match self.rx.recv().await {
                Ok(event) => {
                    if event.session_id == self.cursor.session_id
                        && event.sequence > self.cursor.sequence
                    {
                        self.pending.push_back(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, session_id = %self.cursor.session_id, "SSE receiver lagged; re-reading log");
                    match self.subscriber.poll(&self.cursor) {
                        Ok((events, _)) => self.pending.extend(events),
                        Err(e) => {
                            warn!(error = %e, "Progress stream lost its session");
                            return None;
                        }
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

fn to_sse(event: &ProgressEvent) -> Event {
    Event::default()
        .id(event.sequence.to_string())
        .event(event.status.as_str())
        .data(serde_json::to_string(event).unwrap_or_default())
}

/// Handler for `GET /research/events?sessionId=&after=`.
pub async fn stream_progress(
    State(state): State<GatewayState>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Query(query) = query?;
    let session_id = require_session_id(query.session_id)?;

    // Subscribe before replaying so nothing appended in between is lost.
    let rx = state.store.subscribe();
    // Read before polling: when set, the backlog holds the terminal event
    // unless the client already has it.
    let done = state.subscriber.is_done(&session_id)?;
    let (backlog, _) = state
        .subscriber
        .poll(&Cursor::at(session_id.clone(), query.after))?;

    let tail = Tail {
        rx,
        subscriber: state.subscriber.clone(),
        cursor: Cursor::at(session_id, query.after),
        finished: done && backlog.is_empty(),
        pending: backlog.into(),
    };

    let stream = stream::unfold(tail, |mut tail| async move {
        let event = tail.next().await?;
        Some((Ok(to_sse(&event)), tail))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
