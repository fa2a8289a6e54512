//! Token budgeting and provider dispatch.

pub mod gemini;
pub mod groq;
pub mod provider;
pub mod router;
pub mod tokens;

pub use gemini::GeminiTransport;
pub use groq::GroqTransport;
pub use provider::{Provider, ProviderTransport, TransportFailure, UnknownProvider};
pub use router::{DEFAULT_WAIT, ProviderDispatcher};
pub use tokens::{TokenBudget, estimate_tokens};
