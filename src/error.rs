//! Error types for batt modules using thiserror.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::llm::provider::Provider;

/// Errors from configuration: credentials, provider selection, templates and budgets.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "{variable} environment variable is not set. Please set it with: export {variable}=your_api_key"
    )]
    MissingCredential {
        provider: Provider,
        variable: &'static str,
    },

    #[error("Unsupported AI provider: {requested}. Supported providers are: {supported}")]
    UnsupportedProvider { requested: String, supported: String },

    #[error("Prompt template must contain exactly one {marker} marker, found {found}")]
    TemplateMarker { marker: &'static str, found: usize },

    #[error("Failed to read prompt template: {0}")]
    TemplateRead(#[source] std::io::Error),

    #[error(
        "Prompt template alone needs ~{template_tokens} tokens, which exceeds the {max_total_tokens}-token limit"
    )]
    TemplateExceedsBudget {
        template_tokens: usize,
        max_total_tokens: usize,
    },

    #[error("Invalid token budget: {0}")]
    InvalidBudget(String),
}

/// Errors from reading staged changes and committing.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No staged changes found. Stage your changes first with: git add <files>")]
    NoStagedChanges,

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}

/// Errors from generating a commit message with a provider.
///
/// Every failure is surfaced as-is; nothing here is retried.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(
        "Diff is too large for the {provider} API. The diff contains approximately {diff_tokens} tokens, which exceeds the API limit. Consider committing smaller changes or splitting into multiple commits. Original error: {message}"
    )]
    TooLarge {
        provider: Provider,
        diff_tokens: usize,
        message: String,
    },

    #[error("Network error: Failed to connect to {provider} API. Check your internet connection. ({detail})")]
    Network { provider: Provider, detail: String },

    #[error("Request timeout: {provider} API did not respond within {}.", format_wait(.wait))]
    Timeout { provider: Provider, wait: Duration },

    #[error("{provider} API error: {status} {reason}. {message}")]
    Provider {
        provider: Provider,
        status: u16,
        reason: String,
        message: String,
    },

    #[error("No response from {provider} model")]
    EmptyResponse { provider: Provider },

    #[error("{provider} generated an invalid commit message")]
    InvalidOutput { provider: Provider },
}

/// Coarse category of a [`GenerateError`], for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Size,
    Transport,
    Timeout,
    Provider,
    EmptyResponse,
    InvalidOutput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Size => "size",
            ErrorKind::Transport => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Provider => "provider",
            ErrorKind::EmptyResponse => "empty response",
            ErrorKind::InvalidOutput => "invalid output",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole seconds when the wait has no fractional part, milliseconds otherwise.
fn format_wait(wait: &Duration) -> String {
    if wait.subsec_millis() == 0 && wait.as_secs() > 0 {
        format!("{} seconds", wait.as_secs())
    } else {
        format!("{} ms", wait.as_millis())
    }
}

impl GenerateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::Configuration(_) => ErrorKind::Configuration,
            GenerateError::TooLarge { .. } => ErrorKind::Size,
            GenerateError::Network { .. } => ErrorKind::Transport,
            GenerateError::Timeout { .. } => ErrorKind::Timeout,
            GenerateError::Provider { .. } => ErrorKind::Provider,
            GenerateError::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            GenerateError::InvalidOutput { .. } => ErrorKind::InvalidOutput,
        }
    }
}
