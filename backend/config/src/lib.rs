//! `sportsgpt-config`: Sports GPT runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults
//! - Loading from environment variables
//! - Config redaction for safe logging/display
//! - Validation with production-only hard failures

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{from_env, from_vars, InvalidEnvVarError};
pub use redact::redact;
pub use schema::{
    Environment, LoggingConfig, PineconeConfig, ProviderConfig, ResearchConfig, ServerConfig,
    SportsApiConfig, SportsGptConfig,
};
pub use validation::{ensure_valid, validate, ConfigValidationError, ValidationReport};
