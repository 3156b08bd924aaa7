pub mod mock;
pub mod openai;
pub mod perplexity;
pub mod stats_chat;

use std::collections::HashMap;
use std::sync::Arc;

use sportsgpt_config::{Environment, SportsGptConfig};
use sportsgpt_core::{ChatProvider, ResearchProvider};
use tracing::warn;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;
pub use stats_chat::StatsAugmentedChat;

use crate::sports_api::SportsApiClient;

/// Registry of research providers, looked up by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ResearchProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register every provider the config has credentials for, plus `mock`
    /// outside production.
    pub fn from_config(config: &SportsGptConfig) -> Self {
        let mut registry = Self::new();
        if let Some(perplexity) = PerplexityProvider::from_config(&config.perplexity) {
            registry.register("perplexity", Arc::new(perplexity));
        }
        if let Some(openai) = OpenAiProvider::from_config(&config.openai) {
            registry.register("openai", Arc::new(openai));
        }
        if config.environment != Environment::Production {
            registry.register("mock", Arc::new(MockProvider::new("mock")));
        }
        registry
    }

    /// Register a provider by name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn ResearchProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get providers matching the given names (in order).
    /// Unknown or unconfigured names are skipped with a warning.
    pub fn get_providers(&self, names: &[String]) -> Vec<Arc<dyn ResearchProvider>> {
        names
            .iter()
            .filter_map(|name| {
                let provider = self.providers.get(name).cloned();
                if provider.is_none() {
                    warn!(provider = %name, "Research provider is not available; skipping");
                }
                provider
            })
            .collect()
    }

    /// Get all registered provider names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The `/chat` backend, if an OpenAI-compatible key is configured.
///
/// With sports API credentials the model is wrapped in [`StatsAugmentedChat`].
pub fn chat_provider_from_config(config: &SportsGptConfig) -> Option<Arc<dyn ChatProvider>> {
    let chat: Arc<dyn ChatProvider> = Arc::new(OpenAiProvider::from_config(&config.openai)?);
    match SportsApiClient::from_config(&config.sports_api) {
        Ok(Some(stats)) => Some(Arc::new(StatsAugmentedChat::new(chat, stats))),
        Ok(None) => Some(chat),
        Err(e) => {
            warn!(error = %e, "Sports API is misconfigured; chat runs without live statistics");
            Some(chat)
        }
    }
}
