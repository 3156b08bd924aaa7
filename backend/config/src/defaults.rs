//! Config defaults.

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

pub const DEFAULT_PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar-deep-research";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

pub const DEFAULT_PINECONE_INDEX: &str = "sports-gpt-index";

/// Provider fallback order when `RESEARCH_PROVIDERS` is unset.
pub const DEFAULT_RESEARCH_PROVIDERS: &[&str] = &["perplexity", "openai"];

/// Deep research can take minutes; five is the per-provider ceiling.
pub const DEFAULT_RESEARCH_TIMEOUT_SECS: u64 = 300;

/// Sessions idle longer than this are evicted by housekeeping.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3_600;

pub const DEFAULT_HOUSEKEEPING_INTERVAL_SECS: u64 = 60;

/// Provider names the research crate knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["perplexity", "openai", "mock"];
