//! Sports GPT runtime configuration schema.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::defaults::*;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SportsGptConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub research: ResearchConfig,
    pub perplexity: ProviderConfig,
    pub openai: ProviderConfig,
    /// Vector store settings; carried for validation only.
    pub pinecone: PineconeConfig,
    /// Cricket statistics API; when set, chat answers are backed by live lookups.
    pub sports_api: SportsApiConfig,
}

/// Deployment environment. Validation errors abort startup only in production.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchConfig {
    /// Providers tried in order until one answers.
    pub providers: Vec<String>,
    pub timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub housekeeping_interval_secs: u64,
}

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PineconeConfig {
    pub api_key: Option<String>,
    pub environment: Option<String>,
    pub index_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SportsApiConfig {
    pub api_key: Option<String>,
    pub host: Option<String>,
}

impl Default for SportsGptConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            server: ServerConfig {
                bind_address: DEFAULT_BIND_ADDRESS.to_string(),
                port: DEFAULT_PORT,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_LEVEL.to_string(),
                dir: DEFAULT_LOG_DIR.to_string(),
            },
            research: ResearchConfig {
                providers: DEFAULT_RESEARCH_PROVIDERS
                    .iter()
                    .map(|p| p.to_string())
                    .collect(),
                timeout_secs: DEFAULT_RESEARCH_TIMEOUT_SECS,
                session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
                housekeeping_interval_secs: DEFAULT_HOUSEKEEPING_INTERVAL_SECS,
            },
            perplexity: ProviderConfig {
                api_key: None,
                base_url: DEFAULT_PERPLEXITY_BASE_URL.to_string(),
                model: DEFAULT_PERPLEXITY_MODEL.to_string(),
            },
            openai: ProviderConfig {
                api_key: None,
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
                model: DEFAULT_OPENAI_MODEL.to_string(),
            },
            pinecone: PineconeConfig {
                api_key: None,
                environment: None,
                index_name: DEFAULT_PINECONE_INDEX.to_string(),
            },
            sports_api: SportsApiConfig::default(),
        }
    }
}

impl ResearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_secs(self.housekeeping_interval_secs)
    }
}

impl SportsGptConfig {
    /// `bind:port` string for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}
