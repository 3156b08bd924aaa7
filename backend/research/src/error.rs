use std::time::Duration;

use sportsgpt_core::ProgressError;
use thiserror::Error;

/// Failure of a research run.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("query must not be empty")]
    InvalidQuery,

    #[error("research timed out after {0:?}")]
    Timeout(Duration),

    #[error("all {attempts} research provider(s) failed; last error: {last}")]
    ProvidersFailed { attempts: usize, last: String },

    #[error("no research providers are configured")]
    NoProviders,

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl ResearchError {
    /// Message written into the session's terminal `error` event.
    pub fn user_message(&self) -> &'static str {
        match self {
            ResearchError::Timeout(_) => "Research timed out",
            _ => "Research failed",
        }
    }
}
