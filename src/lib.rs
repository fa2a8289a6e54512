//! batt - A CLI tool that writes conventional commit messages for staged changes.
//!
//! # Overview
//!
//! batt reads the staged diff, fits it into a provider's token budget, asks a
//! text-generation service (Groq or Gemini) for a one-line conventional commit
//! title, validates the answer against the project's rules and commits it.

pub mod commit;
pub mod config;
pub mod error;
pub mod llm;

// Re-export commonly used types
pub use commit::{PromptTemplate, StagedDiff, ValidatedMessage};
pub use config::{Credentials, GenerationConfig};
pub use error::{CommitError, ConfigError, ErrorKind, GenerateError};
pub use llm::{Provider, ProviderDispatcher, TokenBudget};
