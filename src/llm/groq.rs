//! Groq chat-completions transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{ProviderTransport, TransportFailure, failure_from_error, failure_from_response};

const GROQ_BASE_URL: &str = "https://api.groq.com";
const GROQ_CHAT_PATH: &str = "/openai/v1/chat/completions";
const GROQ_MODEL: &str = "llama-3.1-8b-instant";
const TEMPERATURE: f32 = 0.7;
const MAX_RESPONSE_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Sends prompts to Groq's OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct GroqTransport {
    http: Client,
    base_url: String,
    model: String,
}

impl GroqTransport {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, GROQ_BASE_URL)
    }

    /// Point the transport at another host (used by tests).
    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: GROQ_MODEL.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GROQ_CHAT_PATH)
    }
}

#[async_trait]
impl ProviderTransport for GroqTransport {
    async fn generate(
        &self,
        prompt: &str,
        credential: &str,
        wait: Duration,
    ) -> Result<String, TransportFailure> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_RESPONSE_TOKENS,
        };

        debug!("Calling Groq chat API with model {}", self.model);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(credential)
            .timeout(wait)
            .json(&request)
            .send()
            .await
            .map_err(failure_from_error)?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let body: ChatResponse = response.json().await.map_err(failure_from_error)?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(TransportFailure::EmptyResponse)
    }
}
