//! Sports GPT Gateway HTTP API Server
//!
//! Serves research requests, their progress (polling and SSE), chat, and health.

pub mod chat_api;
pub mod error;
pub mod health_api;
pub mod housekeeping;
pub mod progress_stream;
pub mod research_api;
pub mod server;

pub use error::ApiError;
pub use housekeeping::Housekeeper;
pub use server::{GatewayState, build_router, start_server};
