//! Conversational endpoint (`POST /chat`).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use sportsgpt_core::{ChatMessage, ChatRole};
use sportsgpt_logging::redact_sensitive_data;

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
}

/// Handler for `POST /chat`.
pub async fn post_chat(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload?;
    let last = payload
        .messages
        .last()
        .ok_or_else(|| ApiError::bad_request("Invalid messages format"))?;
    if last.role != ChatRole::User {
        return Err(ApiError::bad_request("Last message must be from the user"));
    }

    let chat = state.chat.as_ref().ok_or_else(|| {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Chat provider is not configured")
    })?;

    let content = chat.chat(&payload.messages).await.map_err(|e| {
        ApiError::new(
            StatusCode::BAD_GATEWAY,
            format!("Chat failed: {}", redact_sensitive_data(&e.to_string())),
        )
    })?;

    Ok(Json(ChatResponse { content }))
}
