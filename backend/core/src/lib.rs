//! Progress event log and shared research types for Sports GPT.
//!
//! A long-running research call writes ordered progress events through a
//! [`Publisher`]; UI observers read them back through a [`Subscriber`] with a
//! cursor. The [`EventStore`] is the single source of truth for both.

pub mod error;
pub mod event;
pub mod publisher;
pub mod session;
pub mod store;
pub mod subscriber;
pub mod traits;
pub mod types;

pub use error::ProgressError;
pub use event::{ProgressEvent, ProgressStatus};
pub use publisher::Publisher;
pub use session::{ProgressSession, SessionState};
pub use store::{EventStore, ProgressLog};
pub use subscriber::{Cursor, Subscriber};
pub use traits::{ChatProvider, ResearchProvider, ResearchRequest};
pub use types::{ChatMessage, ChatRole, ImageSource, ResearchResult, Source};
