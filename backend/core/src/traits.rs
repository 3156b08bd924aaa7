use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChatMessage, ResearchResult};

/// A backend that can answer a research query (web search, LLM, or both).
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Provider name (e.g., "perplexity", "openai").
    fn name(&self) -> &str;

    /// Run the query and return the answer with whatever citations the backend offers.
    async fn research(&self, request: &ResearchRequest) -> Result<ResearchResult>;
}

/// A backend that continues a chat conversation.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Return the assistant reply to `messages`.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Request to a research provider.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    /// The query as the user typed it
    pub query: String,
    /// The query after domain-specific shaping
    pub prompt: String,
    pub system_prompt: String,
}
