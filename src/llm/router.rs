//! Provider selection and request dispatch.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::commit::message::{ValidatedMessage, validate_message};
use crate::commit::prompt::{PromptTemplate, assemble_prompt};
use crate::config::{Credentials, GenerationConfig};
use crate::error::{ConfigError, GenerateError};
use crate::llm::gemini::GeminiTransport;
use crate::llm::groq::GroqTransport;
use crate::llm::provider::{Provider, ProviderTransport, TransportFailure, UnknownProvider};
use crate::llm::tokens::TokenBudget;

/// Wait ceiling for a single provider call.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// Routes a generation request to the configured provider.
///
/// Holds one transport per provider, built at startup. Performs exactly one
/// provider call per [`generate`](Self::generate); failures are returned to
/// the caller, never retried.
pub struct ProviderDispatcher {
    transports: BTreeMap<Provider, Box<dyn ProviderTransport>>,
    template: PromptTemplate,
    budget: TokenBudget,
    wait: Duration,
}

impl ProviderDispatcher {
    /// Dispatcher with no transports registered.
    pub fn new(template: PromptTemplate, budget: TokenBudget) -> Self {
        Self {
            transports: BTreeMap::new(),
            template,
            budget,
            wait: DEFAULT_WAIT,
        }
    }

    /// Dispatcher with the HTTP transports for every supported provider.
    pub fn with_default_transports(template: PromptTemplate, budget: TokenBudget) -> Self {
        let http = Client::new();
        Self::new(template, budget)
            .register(Provider::Groq, GroqTransport::new(http.clone()))
            .register(Provider::Gemini, GeminiTransport::new(http))
    }

    /// Register (or replace) the transport for `provider`.
    pub fn register(
        mut self,
        provider: Provider,
        transport: impl ProviderTransport + 'static,
    ) -> Self {
        self.transports.insert(provider, Box::new(transport));
        self
    }

    /// Override the wait ceiling.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Generate a validated commit message for `diff`.
    pub async fn generate(
        &self,
        diff: &str,
        config: &GenerationConfig,
        credentials: &Credentials,
    ) -> Result<ValidatedMessage, GenerateError> {
        let (provider, transport) = self.resolve(&config.provider)?;

        let credential = credentials
            .get(provider)
            .ok_or(ConfigError::MissingCredential {
                provider,
                variable: provider.credential_var(),
            })?;

        if self.template.exceeds_budget(&self.budget) {
            return Err(ConfigError::TemplateExceedsBudget {
                template_tokens: self.template.overhead_tokens(&self.budget),
                max_total_tokens: self.budget.max_total_tokens,
            }
            .into());
        }

        let diff_tokens = self.budget.estimate(diff);
        if diff_tokens > self.budget.max_diff_tokens {
            warn!(
                "Diff is large (estimated {} tokens). Truncating to ~{} tokens to fit API limits...",
                diff_tokens, self.budget.max_diff_tokens
            );
        }

        let prompt = assemble_prompt(&self.template, diff, &self.budget);
        if prompt.further_truncated {
            warn!(
                "Total prompt size exceeded {} tokens. Further truncation applied.",
                self.budget.max_total_tokens
            );
        }
        debug!(
            "Prompt for {}: ~{} tokens, diff truncated={}, further truncated={}",
            provider, prompt.estimated_tokens, prompt.diff_truncated, prompt.further_truncated
        );

        info!("Requesting commit message from {}", provider);

        let call = transport.generate(&prompt.text, credential, self.wait);
        let raw = match timeout(self.wait, call).await {
            Err(_) => return Err(self.timeout_error(provider)),
            Ok(Err(failure)) => return Err(self.map_failure(provider, failure, diff_tokens)),
            Ok(Ok(raw)) => raw,
        };

        if raw.trim().is_empty() {
            return Err(GenerateError::EmptyResponse { provider });
        }

        validate_message(Some(&raw), config).ok_or_else(|| {
            debug!("Unusable model output: {:?}", raw);
            GenerateError::InvalidOutput { provider }
        })
    }

    fn resolve(&self, name: &str) -> Result<(Provider, &dyn ProviderTransport), ConfigError> {
        let unsupported = |requested: String| ConfigError::UnsupportedProvider {
            requested,
            supported: self
                .transports
                .keys()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", "),
        };

        let provider: Provider = name
            .parse()
            .map_err(|UnknownProvider(requested)| unsupported(requested))?;

        match self.transports.get(&provider) {
            Some(transport) => Ok((provider, transport.as_ref())),
            None => Err(unsupported(provider.id().to_string())),
        }
    }

    fn timeout_error(&self, provider: Provider) -> GenerateError {
        GenerateError::Timeout {
            provider,
            wait: self.wait,
        }
    }

    fn map_failure(
        &self,
        provider: Provider,
        failure: TransportFailure,
        diff_tokens: usize,
    ) -> GenerateError {
        match failure {
            TransportFailure::PayloadTooLarge { message } => GenerateError::TooLarge {
                provider,
                diff_tokens,
                message,
            },
            TransportFailure::Status {
                status,
                reason,
                message,
            } => GenerateError::Provider {
                provider,
                status,
                reason,
                message,
            },
            TransportFailure::Timeout => self.timeout_error(provider),
            TransportFailure::Network(detail) => GenerateError::Network { provider, detail },
            TransportFailure::EmptyResponse => GenerateError::EmptyResponse { provider },
            TransportFailure::MalformedBody(detail) => GenerateError::Provider {
                provider,
                status: 200,
                reason: "OK".to_string(),
                message: format!("Unreadable response body: {detail}"),
            },
        }
    }
}
