use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sportsgpt_config::ProviderConfig;
use sportsgpt_core::{
    ChatMessage, ChatProvider, ChatRole, ResearchProvider, ResearchRequest, ResearchResult,
};
use sportsgpt_logging::redact_sensitive_data;

use crate::prompts::CHAT_SYSTEM_PROMPT;

/// OpenAI-compatible chat completions provider (OpenAI, Groq, ...).
///
/// Used as a research fallback without live search, and as the `/chat` backend.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: sportsgpt_config::defaults::DEFAULT_OPENAI_BASE_URL.to_string(),
            model: sportsgpt_config::defaults::DEFAULT_OPENAI_MODEL.to_string(),
        }
    }

    /// Build from config; `None` when no API key is set.
    pub fn from_config(config: &ProviderConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        Some(
            Self::new(api_key)
                .with_base_url(&config.base_url)
                .with_model(&config.model),
        )
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let start = Instant::now();
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens: 4096,
        };

        debug!(model = %self.model, messages = messages.len(), "Sending request to OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "OpenAI returned {}: {}",
                status,
                redact_sensitive_data(&error_body)
            );
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .context("Empty response from OpenAI")?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            tokens = completion.usage.and_then(|u| u.total_tokens).unwrap_or(0),
            "OpenAI completion received"
        );

        Ok(content)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[async_trait]
impl ResearchProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn research(&self, request: &ResearchRequest) -> Result<ResearchResult> {
        let messages = [
            ChatMessage::new(ChatRole::System, request.system_prompt.as_str()),
            ChatMessage::new(ChatRole::User, request.prompt.as_str()),
        ];
        let content = self.complete(&messages, 0.2).await?;
        Ok(ResearchResult {
            content,
            ..Default::default()
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut conversation = Vec::with_capacity(messages.len() + 1);
        if messages.first().map(|m| m.role) != Some(ChatRole::System) {
            conversation.push(ChatMessage::new(ChatRole::System, CHAT_SYSTEM_PROMPT));
        }
        conversation.extend_from_slice(messages);
        self.complete(&conversation, 0.7).await
    }
}
