//! Gemini generateContent transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{ProviderTransport, TransportFailure, failure_from_error, failure_from_response};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_MODEL: &str = "gemini-3-flash-preview";
const API_KEY_HEADER: &str = "x-goog-api-key";
const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Sends prompts to Gemini's generateContent endpoint.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiTransport {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, GEMINI_BASE_URL)
    }

    /// Point the transport at another host (used by tests).
    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: GEMINI_MODEL.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ProviderTransport for GeminiTransport {
    async fn generate(
        &self,
        prompt: &str,
        credential: &str,
        wait: Duration,
    ) -> Result<String, TransportFailure> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationParams {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        debug!("Calling Gemini generateContent API with model {}", self.model);

        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, credential)
            .timeout(wait)
            .json(&request)
            .send()
            .await
            .map_err(failure_from_error)?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let body: GenerateResponse = response.json().await.map_err(failure_from_error)?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(TransportFailure::EmptyResponse)
    }
}
