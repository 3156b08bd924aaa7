//! HTTP error mapping.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use sportsgpt_core::ProgressError;
use sportsgpt_research::ResearchError;

/// An error rendered as `{ "error": ... }` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Extra top-level fields merged into the body (e.g. `meta`).
    pub extra: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            extra: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        let status = match err {
            ProgressError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ProgressError::SessionClosed(_) | ProgressError::SessionExists(_) => {
                StatusCode::CONFLICT
            }
            ProgressError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ResearchError> for ApiError {
    fn from(err: ResearchError) -> Self {
        match err {
            ResearchError::Progress(inner) => inner.into(),
            ResearchError::InvalidQuery => Self::bad_request("Query is required"),
            ResearchError::Timeout(_) => Self::new(StatusCode::GATEWAY_TIMEOUT, err.to_string()),
            ResearchError::ProvidersFailed { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            ResearchError::NoProviders => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
        }
    }
}

// Extractor rejections keep axum's status but use the JSON error body.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        let mut body = json!({ "error": self.message });
        if let (Some(Value::Object(extra)), Some(map)) = (self.extra, body.as_object_mut()) {
            map.extend(extra);
        }
        (self.status, Json(body)).into_response()
    }
}
