//! `POST /research` and `GET /research/progress`.

use std::time::Instant;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use sportsgpt_core::{Cursor, ProgressEvent, ResearchResult};

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchBody {
    #[serde(default)]
    pub query: String,
    /// Client-chosen id so the UI can start polling before the answer returns.
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchMeta {
    pub session_id: String,
    /// Milliseconds spent handling the request.
    pub processing_time: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    #[serde(flatten)]
    pub result: ResearchResult,
    pub meta: ResearchMeta,
}

/// Handler for `POST /research`.
pub async fn post_research(
    State(state): State<GatewayState>,
    body: Result<Json<ResearchBody>, JsonRejection>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let Json(body) = body?;
    let session_id = body
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let started = Instant::now();

    info!(session_id = %session_id, "Research request received");
    let outcome = state.orchestrator.run(&session_id, &body.query).await;

    let meta = ResearchMeta {
        session_id,
        processing_time: started.elapsed().as_millis() as u64,
        timestamp: Utc::now(),
    };

    match outcome {
        Ok(result) => Ok(Json(ResearchResponse { result, meta })),
        Err(err) => Err(ApiError::from(err).with_extra(json!({ "meta": meta }))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub session_id: Option<String>,
    /// Highest sequence the client already holds.
    #[serde(default)]
    pub after: u64,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub events: Vec<ProgressEvent>,
    /// Sequence of the last event delivered; pass it back as `after`.
    pub cursor: u64,
    /// True once `events` includes the terminal event (or it was already consumed).
    pub done: bool,
}

pub(crate) fn require_session_id(session_id: Option<String>) -> Result<String, ApiError> {
    session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("sessionId is required"))
}

/// Handler for `GET /research/progress?sessionId=&after=`.
pub async fn get_progress(
    State(state): State<GatewayState>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let Query(query) = query?;
    let session_id = require_session_id(query.session_id)?;

    // Read the flag first: if it is set, the poll below is guaranteed to
    // include the terminal event.
    let done = state.subscriber.is_done(&session_id)?;
    let (events, cursor) = state
        .subscriber
        .poll(&Cursor::at(session_id, query.after))?;

    Ok(Json(ProgressResponse {
        events,
        cursor: cursor.sequence,
        done,
    }))
}
