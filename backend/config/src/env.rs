//! Load configuration from environment variables.
//!
//! Empty values are treated as unset. Numeric variables that fail to parse are
//! an error rather than a silent fallback to the default.

use anyhow::Result;
use std::collections::HashMap;
use std::str::FromStr;

use crate::schema::{Environment, SportsGptConfig};

/// Error returned for env vars that are set but unparsable.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value \"{value}\" for env var \"{var_name}\"")]
pub struct InvalidEnvVarError {
    pub var_name: String,
    pub value: String,
}

/// Load the config from the process environment.
pub fn from_env() -> Result<SportsGptConfig> {
    from_vars(&std::env::vars().collect())
}

/// Load the config from a provided map (useful for testing).
pub fn from_vars(env: &HashMap<String, String>) -> Result<SportsGptConfig> {
    let mut config = SportsGptConfig::default();

    if let Some(value) = var(env, "SPORTSGPT_ENV") {
        config.environment = match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" => Environment::Development,
            _ => return Err(invalid("SPORTSGPT_ENV", &value).into()),
        };
    }

    if let Some(bind) = var(env, "SPORTSGPT_BIND") {
        config.server.bind_address = bind;
    }
    config.server.port = parse(env, "SPORTSGPT_PORT", config.server.port)?;

    if let Some(level) = var(env, "RUST_LOG") {
        config.logging.level = level;
    }
    if let Some(dir) = var(env, "SPORTSGPT_LOG_DIR") {
        config.logging.dir = dir;
    }

    if let Some(providers) = var(env, "RESEARCH_PROVIDERS") {
        config.research.providers = providers
            .split(',')
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
    }
    config.research.timeout_secs =
        parse(env, "RESEARCH_TIMEOUT_SECS", config.research.timeout_secs)?;
    config.research.session_ttl_secs =
        parse(env, "SESSION_TTL_SECS", config.research.session_ttl_secs)?;
    config.research.housekeeping_interval_secs = parse(
        env,
        "HOUSEKEEPING_INTERVAL_SECS",
        config.research.housekeeping_interval_secs,
    )?;

    config.perplexity.api_key = var(env, "PERPLEXITY_API_KEY");
    if let Some(model) = var(env, "PERPLEXITY_MODEL") {
        config.perplexity.model = model;
    }
    if let Some(url) = var(env, "PERPLEXITY_BASE_URL") {
        config.perplexity.base_url = url;
    }

    // Groq serves the same chat completions API, so its key is an accepted stand-in.
    config.openai.api_key = var(env, "OPENAI_API_KEY").or_else(|| var(env, "GROQ_API_KEY"));
    if let Some(model) = var(env, "OPENAI_MODEL") {
        config.openai.model = model;
    }
    if let Some(url) = var(env, "OPENAI_BASE_URL") {
        config.openai.base_url = url;
    }

    config.pinecone.api_key = var(env, "PINECONE_API_KEY");
    config.pinecone.environment = var(env, "PINECONE_ENVIRONMENT");
    if let Some(index) = var(env, "PINECONE_INDEX_NAME") {
        config.pinecone.index_name = index;
    }

    config.sports_api.api_key = var(env, "SPORTS_API_KEY");
    config.sports_api.host = var(env, "SPORTS_API_HOST");

    Ok(config)
}

fn var(env: &HashMap<String, String>, name: &str) -> Option<String> {
    env.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse<T: FromStr>(env: &HashMap<String, String>, name: &str, default: T) -> Result<T> {
    match var(env, name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| invalid(name, &value).into()),
    }
}

fn invalid(name: &str, value: &str) -> InvalidEnvVarError {
    InvalidEnvVarError {
        var_name: name.to_string(),
        value: value.to_string(),
    }
}
