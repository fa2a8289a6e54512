//! Provider identifiers and the transport capability each provider implements.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Supported text-generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    /// Fast free-tier service (default).
    Groq,
    /// General-purpose service.
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Groq, Provider::Gemini];

    /// Identifier used in config files.
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::Gemini => "Gemini",
        }
    }

    /// Environment variable the caller reads this provider's key from.
    pub fn credential_var(&self) -> &'static str {
        match self {
            Provider::Groq => "BATT_GROQ_API_KEY",
            Provider::Gemini => "BATT_GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider name that is not in [`Provider::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Provider::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownProvider(name.to_lowercase()))
    }
}

/// Structured failure from a provider transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The provider rejected the request as too large (HTTP 413).
    PayloadTooLarge { message: String },
    /// Any other non-success response.
    Status {
        status: u16,
        reason: String,
        message: String,
    },
    /// No response within the wait ceiling.
    Timeout,
    /// The provider could not be reached.
    Network(String),
    /// A success response with no generated text.
    EmptyResponse,
    /// A success response whose body could not be decoded.
    MalformedBody(String),
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::PayloadTooLarge { message } => write!(f, "payload too large: {message}"),
            TransportFailure::Status { status, reason, message } => {
                write!(f, "{status} {reason}: {message}")
            }
            TransportFailure::Timeout => f.write_str("timed out"),
            TransportFailure::Network(detail) => write!(f, "network error: {detail}"),
            TransportFailure::EmptyResponse => f.write_str("empty response"),
            TransportFailure::MalformedBody(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}

/// One provider's request/response capability.
///
/// Implementations send `prompt` authenticated with `credential` and give up
/// after `wait`. This abstraction allows mocking the HTTP layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        credential: &str,
        wait: Duration,
    ) -> Result<String, TransportFailure>;
}

/// `{"error": {"message": ...}}` body both providers use for failures.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Turn a non-success HTTP response into a [`TransportFailure`].
pub(crate) async fn failure_from_response(response: reqwest::Response) -> TransportFailure {
    let status = response.status();
    let message = response
        .json::<ErrorEnvelope>()
        .await
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| "Unknown error".to_string());

    if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE {
        return TransportFailure::PayloadTooLarge { message };
    }

    TransportFailure::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
        message,
    }
}

/// Classify a failed send or body read.
pub(crate) fn failure_from_error(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else if err.is_decode() {
        TransportFailure::MalformedBody(err.to_string())
    } else {
        TransportFailure::Network(err.to_string())
    }
}
