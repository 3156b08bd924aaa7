//! Config validation: collect every problem in one pass with the field path it belongs to.

use crate::defaults::KNOWN_PROVIDERS;
use crate::schema::{Environment, SportsGptConfig};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Log every finding through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for error in &self.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &SportsGptConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_research(config, &mut report);
    validate_integrations(config, &mut report);
    report
}

/// Validate, log the findings, and fail on errors when running in production.
///
/// In development the report is returned even when it contains errors so the
/// server can still start against mock providers.
pub fn ensure_valid(config: &SportsGptConfig) -> anyhow::Result<ValidationReport> {
    let report = validate(config);
    report.log();
    if config.environment == Environment::Production && !report.is_valid() {
        let first = &report.errors[0];
        anyhow::bail!(
            "{} config error(s) in production; first: {first}",
            report.errors.len()
        );
    }
    Ok(report)
}

fn validate_server(config: &SportsGptConfig, report: &mut ValidationReport) {
    if config.server.bind_address.trim().is_empty() {
        report.error("server.bindAddress", "Bind address cannot be empty");
    }
    let port = config.server.port;
    if port != 0 && port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
}

fn validate_research(config: &SportsGptConfig, report: &mut ValidationReport) {
    let research = &config.research;
    if research.providers.is_empty() {
        report.error("research.providers", "At least one research provider is required");
    }
    for (i, name) in research.providers.iter().enumerate() {
        let path = format!("research.providers[{i}]");
        match name.as_str() {
            "perplexity" if config.perplexity.api_key.is_none() => {
                report.error(&path, "PERPLEXITY_API_KEY is required for the perplexity provider");
            }
            "openai" if config.openai.api_key.is_none() => {
                report.error(&path, "OPENAI_API_KEY (or GROQ_API_KEY) is required for the openai provider");
            }
            "mock" if config.environment == Environment::Production => {
                report.error(&path, "Mock provider serves canned answers and cannot run in production");
            }
            known if KNOWN_PROVIDERS.contains(&known) => {}
            unknown => report.error(&path, format!("Unknown research provider '{unknown}'")),
        }
    }
    if research.timeout_secs == 0 {
        report.error("research.timeoutSecs", "timeoutSecs must be > 0");
    }
    if research.session_ttl_secs == 0 {
        report.error("research.sessionTtlSecs", "sessionTtlSecs must be > 0");
    }
    if research.housekeeping_interval_secs == 0 {
        report.error(
            "research.housekeepingIntervalSecs",
            "housekeepingIntervalSecs must be > 0",
        );
    }
}

fn validate_integrations(config: &SportsGptConfig, report: &mut ValidationReport) {
    if config.pinecone.api_key.is_none() {
        report.warn("pinecone.apiKey", "PINECONE_API_KEY is not set; vector search is unavailable");
    } else if config.pinecone.environment.is_none() {
        report.warn("pinecone.environment", "PINECONE_ENVIRONMENT is not set");
    }
    if config.sports_api.api_key.is_none() || config.sports_api.host.is_none() {
        report.warn(
            "sportsApi",
            "SPORTS_API_KEY and SPORTS_API_HOST are not both set; live statistics are unavailable",
        );
    }
}
