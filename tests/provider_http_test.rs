//! Integration tests for the Groq and Gemini HTTP transports against a mock server.

use std::time::Duration;

use batt::llm::{GeminiTransport, GroqTransport, ProviderTransport, TransportFailure};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROQ_PATH: &str = "/openai/v1/chat/completions";
const GEMINI_PATH: &str = "/v1beta/models/gemini-3-flash-preview:generateContent";
const WAIT: Duration = Duration::from_secs(5);

fn groq(server: &MockServer) -> GroqTransport {
    GroqTransport::with_base_url(Client::new(), server.uri())
}

fn gemini(server: &MockServer) -> GeminiTransport {
    GeminiTransport::with_base_url(Client::new(), server.uri())
}

fn groq_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}

// =============================================================================
// Groq
// =============================================================================

#[tokio::test]
async fn test_groq_success_sends_bearer_and_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .and(header("authorization", "Bearer gsk_test"))
        .and(body_partial_json(json!({
            "model": "llama-3.1-8b-instant",
            "messages": [{"role": "user", "content": "the prompt"}],
            "max_tokens": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(groq_reply("fix: handle eof")))
        .expect(1)
        .mount(&server)
        .await;

    let text = groq(&server).generate("the prompt", "gsk_test", WAIT).await.unwrap();
    assert_eq!(text, "fix: handle eof");
}

#[tokio::test]
async fn test_groq_413_is_payload_too_large() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(
            ResponseTemplate::new(413)
                .set_body_json(json!({"error": {"message": "Request too large for model"}})),
        )
        .mount(&server)
        .await;

    let err = groq(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert_eq!(
        err,
        TransportFailure::PayloadTooLarge {
            message: "Request too large for model".to_string()
        }
    );
}

#[tokio::test]
async fn test_groq_401_carries_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "Invalid API Key"}})),
        )
        .mount(&server)
        .await;

    let err = groq(&server).generate("p", "bad", WAIT).await.unwrap_err();
    assert_eq!(
        err,
        TransportFailure::Status {
            status: 401,
            reason: "Unauthorized".to_string(),
            message: "Invalid API Key".to_string(),
        }
    );
}

#[tokio::test]
async fn test_groq_error_without_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = groq(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert!(matches!(
        err,
        TransportFailure::Status { status: 503, ref message, .. } if message == "Unknown error"
    ));
}

#[tokio::test]
async fn test_groq_empty_choices_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = groq(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert_eq!(err, TransportFailure::EmptyResponse);
}

#[tokio::test]
async fn test_groq_blank_content_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(groq_reply("   ")))
        .mount(&server)
        .await;

    let err = groq(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert_eq!(err, TransportFailure::EmptyResponse);
}

#[tokio::test]
async fn test_groq_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(groq_reply("feat: late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = groq(&server)
        .generate("p", "k", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert_eq!(err, TransportFailure::Timeout);
}

#[tokio::test]
async fn test_groq_unreachable_host_is_network_failure() {
    let transport = GroqTransport::with_base_url(Client::new(), "http://127.0.0.1:1");
    let err = transport.generate("p", "k", WAIT).await.unwrap_err();
    assert!(matches!(err, TransportFailure::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_groq_non_json_success_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GROQ_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = groq(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert!(matches!(err, TransportFailure::MalformedBody(_)), "got {err:?}");
}

// =============================================================================
// Gemini
// =============================================================================

#[tokio::test]
async fn test_gemini_success_sends_key_header_and_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("x-goog-api-key", "gem_test"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": "the prompt"}]}],
            "generationConfig": {"maxOutputTokens": 100}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("refactor: split router")))
        .expect(1)
        .mount(&server)
        .await;

    let text = gemini(&server).generate("the prompt", "gem_test", WAIT).await.unwrap();
    assert_eq!(text, "refactor: split router");
}

#[tokio::test]
async fn test_gemini_413_is_payload_too_large() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let err = gemini(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert_eq!(
        err,
        TransportFailure::PayloadTooLarge {
            message: "Unknown error".to_string()
        }
    );
}

#[tokio::test]
async fn test_gemini_403_carries_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let err = gemini(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert_eq!(
        err,
        TransportFailure::Status {
            status: 403,
            reason: "Forbidden".to_string(),
            message: "API key not valid".to_string(),
        }
    );
}

#[tokio::test]
async fn test_gemini_no_candidates_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = gemini(&server).generate("p", "k", WAIT).await.unwrap_err();
    assert_eq!(err, TransportFailure::EmptyResponse);
}

#[tokio::test]
async fn test_gemini_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply("feat: late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = gemini(&server)
        .generate("p", "k", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert_eq!(err, TransportFailure::Timeout);
}
