use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sportsgpt_config::ProviderConfig;
use sportsgpt_core::{ImageSource, ResearchProvider, ResearchRequest, ResearchResult, Source};
use sportsgpt_logging::redact_sensitive_data;

use crate::query::image_context_from_url;

const UNTITLED_SOURCE: &str = "Untitled Source";

/// Perplexity Sonar deep-research provider.
pub struct PerplexityProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl PerplexityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: sportsgpt_config::defaults::DEFAULT_PERPLEXITY_BASE_URL.to_string(),
            model: sportsgpt_config::defaults::DEFAULT_PERPLEXITY_MODEL.to_string(),
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
}

#[derive(Serialize)]
struct SonarRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SonarResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    citations: Option<Citations>,
    #[serde(default)]
    search_queries: Vec<String>,
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

/// Sonar returns either structured citations or a bare list of URLs.
#[derive(Deserialize)]
#[serde(untagged)]
enum Citations {
    Structured {
        #[serde(default)]
        texts: Vec<CitationText>,
        #[serde(default)]
        images: Vec<CitationImage>,
    },
    Urls(Vec<String>),
}

#[derive(Deserialize)]
struct CitationText {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Deserialize)]
struct CitationImage {
    url: String,
    origin: Option<String>,
    height: Option<u32>,
    width: Option<u32>,
    title: Option<String>,
}

impl From<CitationText> for Source {
    fn from(text: CitationText) -> Self {
        let title = if text.title.trim().is_empty() {
            UNTITLED_SOURCE.to_string()
        } else {
            text.title
        };
        Source {
            title,
            url: text.url,
            snippet: text.snippet,
        }
    }
}

impl From<CitationImage> for ImageSource {
    fn from(image: CitationImage) -> Self {
        let context = image
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| image_context_from_url(&image.url));
        ImageSource {
            url: image.url,
            origin: image.origin,
            height: image.height,
            width: image.width,
            context: Some(context),
        }
    }
}

#[async_trait]
impl ResearchProvider for PerplexityProvider {
    fn name(&self) -> &str {
        "perplexity"
    }

    async fn research(&self, request: &ResearchRequest) -> Result<ResearchResult> {
        let start = Instant::now();

        let body = SonarRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                WireMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: 0.1,
            max_tokens: 4096,
        };

        debug!(model = %self.model, "Sending request to Perplexity");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Perplexity HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Perplexity returned {}: {}",
                status,
                redact_sensitive_data(&error_body)
            );
        }

        let sonar: SonarResponse = response
            .json()
            .await
            .context("Failed to parse Perplexity response")?;

        let content = sonar
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .context("Empty response from Perplexity")?;

        let (sources, images) = match sonar.citations {
            Some(Citations::Structured { texts, images }) => (
                texts.into_iter().map(Source::from).collect(),
                images.into_iter().map(ImageSource::from).collect(),
            ),
            Some(Citations::Urls(urls)) => (
                urls.into_iter()
                    .map(|url| Source {
                        title: UNTITLED_SOURCE.to_string(),
                        url,
                        snippet: String::new(),
                    })
                    .collect(),
                Vec::new(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            sources = sources.len(),
            images = images.len(),
            "Perplexity research complete"
        );

        Ok(ResearchResult {
            content,
            sources,
            images,
            search_queries: sonar.search_queries,
        })
    }
}
