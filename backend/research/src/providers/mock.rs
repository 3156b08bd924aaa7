use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use sportsgpt_core::{
    ChatMessage, ChatProvider, ResearchProvider, ResearchRequest, ResearchResult, Source,
};

/// A provider that returns canned answers, for tests and keyless development.
pub struct MockProvider {
    name: String,
    fixed_response: Option<ResearchResult>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, response: ResearchResult) -> Self {
        self.fixed_response = Some(response);
        self
    }

    /// Fail every call with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            anyhow::bail!("{}: {}", self.name, message);
        }
        Ok(())
    }
}

#[async_trait]
impl ResearchProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn research(&self, request: &ResearchRequest) -> Result<ResearchResult> {
        self.respond().await?;
        Ok(self.fixed_response.clone().unwrap_or_else(|| ResearchResult {
            content: format!("Mock research answer for: {}", request.query),
            sources: vec![Source {
                title: "Mock Source".into(),
                url: "https://example.com/cricket".into(),
                snippet: String::new(),
            }],
            ..Default::default()
        }))
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.respond().await?;
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        Ok(format!("Mock reply to: {last}"))
    }
}
