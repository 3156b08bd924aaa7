//! Research providers and the orchestrator that drives a research request
//! through them while publishing progress events.

pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod query;
pub mod sports_api;

pub use error::ResearchError;
pub use orchestrator::ResearchOrchestrator;
pub use providers::{
    chat_provider_from_config, MockProvider, OpenAiProvider, PerplexityProvider, ProviderRegistry,
    StatsAugmentedChat,
};
pub use sports_api::SportsApiClient;
