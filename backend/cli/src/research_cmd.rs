//! CLI Research Command
//!
//! Starts a research request and follows its progress by polling with a
//! cursor, printing every event exactly once. A client-side watchdog gives up
//! if no terminal event arrives in time.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until};
use uuid::Uuid;

use sportsgpt_core::{ProgressEvent, ResearchResult};

use crate::terminal_output::{format_event, note_info, render_sources, supports_color};

/// One page of `GET /research/progress`.
#[derive(Debug, Deserialize)]
pub struct ProgressPage {
    pub events: Vec<ProgressEvent>,
    pub cursor: u64,
    pub done: bool,
}

/// Final response of `POST /research`.
#[derive(Debug, Deserialize)]
pub struct ResearchReply {
    #[serde(flatten)]
    pub result: ResearchResult,
    pub meta: Value,
}

pub struct ResearchOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

/// HTTP client for the research endpoints.
#[derive(Clone)]
pub struct ResearchClient {
    client: Client,
    base_url: String,
}

impl ResearchClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch events after `after`; `None` while the session does not exist yet.
    pub async fn poll(&self, session_id: &str, after: u64) -> Result<Option<ProgressPage>> {
        let response = self
            .client
            .get(format!("{}/research/progress", self.base_url))
            .query(&[("sessionId", session_id), ("after", &after.to_string())])
            .send()
            .await
            .context("Progress request failed")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("Progress request returned {}", response.status());
        }
        let page = response
            .json()
            .await
            .context("Failed to parse progress response")?;
        Ok(Some(page))
    }

    /// Start the research call in the background.
    pub fn start(&self, session_id: &str, query: &str) -> JoinHandle<Result<ResearchReply>> {
        let request = self
            .client
            .post(format!("{}/research", self.base_url))
            .json(&json!({ "query": query, "sessionId": session_id }));
        tokio::spawn(async move {
            let response = request.send().await.context("Research request failed")?;
            let status = response.status();
            let body: Value = response
                .json()
                .await
                .context("Failed to parse research response")?;
            if !status.is_success() {
                bail!(
                    "Research failed ({}): {}",
                    status,
                    body["error"].as_str().unwrap_or("unknown error")
                );
            }
            serde_json::from_value(body).context("Unexpected research response shape")
        })
    }

    /// Poll until the session reports `done`, handing each new event to `on_event`.
    ///
    /// Returns the events seen, or an error once `timeout` has elapsed.
    pub async fn follow(
        &self,
        session_id: &str,
        options: &ResearchOptions,
        started: Option<&JoinHandle<Result<ResearchReply>>>,
        mut on_event: impl FnMut(&ProgressEvent),
    ) -> Result<Vec<ProgressEvent>> {
        let deadline = Instant::now() + options.timeout;
        let mut cursor = 0;
        let mut seen = Vec::new();

        loop {
            match self.poll(session_id, cursor).await? {
                Some(page) => {
                    for event in &page.events {
                        on_event(event);
                    }
                    seen.extend(page.events);
                    cursor = page.cursor;
                    if page.done {
                        return Ok(seen);
                    }
                }
                // The request was rejected before a session was opened.
                None if started.is_some_and(|handle| handle.is_finished()) => return Ok(seen),
                None => {}
            }

            tokio::select! {
                _ = sleep_until(deadline) => bail!("research timed out after {}s", options.timeout.as_secs()),
                _ = sleep(options.interval) => {}
            }
        }
    }
}

pub async fn run(base_url: &str, query: &str, options: ResearchOptions) -> Result<()> {
    let client = ResearchClient::new(base_url);
    let session_id = Uuid::new_v4().to_string();
    let color = supports_color();

    note_info(&format!("Researching \"{query}\" (session {session_id})"));
    let request = client.start(&session_id, query);

    let followed = client
        .follow(&session_id, &options, Some(&request), |event| {
            println!("{}", format_event(event, color));
        })
        .await;
    if let Err(e) = followed {
        request.abort();
        return Err(e);
    }

    let reply = request.await.context("Research task panicked")??;
    println!("\n{}\n", reply.result.content);
    if !reply.result.sources.is_empty() {
        println!("Sources:");
        print!("{}", render_sources(&reply.result.sources, color));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event(sequence: u64, status: &str, pct: u8, terminal: bool) -> Value {
        json!({
            "sessionId": "s1",
            "sequence": sequence,
            "status": status,
            "message": status,
            "completedPct": pct,
            "timestamp": "2024-03-01T10:00:00Z",
            "isTerminal": terminal
        })
    }

    fn options(timeout_ms: u64) -> ResearchOptions {
        ResearchOptions {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_follow_advances_cursor_until_done() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/research/progress"))
            .and(query_param("after", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [event(1, "initiated", 0, false), event(2, "searching", 25, false)],
                "cursor": 2,
                "done": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/research/progress"))
            .and(query_param("after", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [event(3, "completed", 100, true)],
                "cursor": 3,
                "done": true
            })))
            .mount(&server)
            .await;

        let client = ResearchClient::new(&server.uri());
        let mut printed = Vec::new();
        let seen = client
            .follow("s1", &options(5_000), None, |e| printed.push(e.sequence))
            .await
            .unwrap();
        assert_eq!(printed, vec![1, 2, 3]);
        assert!(seen.last().unwrap().is_terminal);
    }

    #[tokio::test]
    async fn test_watchdog_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/research/progress"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [],
                "cursor": 0,
                "done": false
            })))
            .mount(&server)
            .await;

        let client = ResearchClient::new(&server.uri());
        let err = client
            .follow("s1", &options(50), None, |_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("research timed out"));
    }

    #[tokio::test]
    async fn test_missing_session_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
            .mount(&server)
            .await;

        let client = ResearchClient::new(&server.uri());
        assert!(client.poll("s1", 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_reports_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/research"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "error": "all 1 research provider(s) failed",
                "meta": {"sessionId": "s1"}
            })))
            .mount(&server)
            .await;

        let client = ResearchClient::new(&server.uri());
        let err = client.start("s1", "Ashes").await.unwrap().unwrap_err();
        assert!(err.to_string().contains("502"));
    }
}
