/*!
 * Integration tests for the Anthropic client against a local mock server
 */

use anyhow::Result;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use animejp::analysis::StudyAnalyzer;
use animejp::errors::{AnalysisError, ProviderError};
use animejp::providers::Provider;
use animejp::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::common;

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 12, "output_tokens": 34}
    })
}

/// Test that the client sends the expected headers and body and reads the text back
#[tokio::test]
async fn test_complete_withSuccessfulResponse_shouldReturnText() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"model": "claude-test", "max_tokens": 256, "system": "sys"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("こんにちは")))
        .expect(1)
        .mount(&server)
        .await;

    let client = Anthropic::new("sk-test", server.uri());
    let request = AnthropicRequest::new("claude-test", 256)
        .system("sys")
        .add_message("user", "hi");

    let response = client.complete(request).await?;

    assert_eq!(response.text(), "こんにちは");
    assert_eq!(response.usage.output_tokens, 34);
    Ok(())
}

/// Test that 401 maps to an authentication error
#[tokio::test]
async fn test_complete_withUnauthorized_shouldReturnAuthenticationError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let client = Anthropic::new("bad", server.uri());
    let result = client.complete(AnthropicRequest::new("m", 16).add_message("user", "x")).await;

    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
}

/// Test that 429 maps to a rate limit error
#[tokio::test]
async fn test_complete_withTooManyRequests_shouldReturnRateLimitError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = Anthropic::new("k", server.uri());
    let result = client.complete(AnthropicRequest::new("m", 16).add_message("user", "x")).await;

    match result {
        Err(ProviderError::RateLimitExceeded(body)) => assert_eq!(body, "slow down"),
        other => panic!("expected rate limit error, got {:?}", other),
    }
}

/// Test that other failures keep their status code
#[tokio::test]
async fn test_complete_withServerError_shouldReturnApiError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = Anthropic::new("k", server.uri());
    let result = client.complete(AnthropicRequest::new("m", 16).add_message("user", "x")).await;

    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 503, .. })));
}

/// Test that an unreadable success body is a parse error
#[tokio::test]
async fn test_complete_withMalformedBody_shouldReturnParseError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let client = Anthropic::new("k", server.uri());
    let result = client.complete(AnthropicRequest::new("m", 16).add_message("user", "x")).await;

    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}

/// Test the analyzer end to end over HTTP
#[tokio::test]
async fn test_analyze_overHttp_shouldParseStudyMaterial() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(common::SAMPLE_ANSWER)))
        .mount(&server)
        .await;

    let client = Anthropic::new("k", server.uri());
    let analyzer = StudyAnalyzer::new("claude-test", 1024, 8000);

    let material = analyzer.analyze(&client, "覚悟はできている").await?;

    assert_eq!(material.vocabulary.len(), 1);
    assert_eq!(material.grammar.len(), 1);
    Ok(())
}

/// Test that an unreachable endpoint is a connection error
#[tokio::test]
async fn test_analyze_withUnreachableEndpoint_shouldReturnConnectionError() {
    let client = Anthropic::new("k", "http://127.0.0.1:9");
    let analyzer = StudyAnalyzer::new("claude-test", 1024, 8000);

    let result = analyzer.analyze(&client, "字幕").await;

    assert!(matches!(result, Err(AnalysisError::Provider(ProviderError::ConnectionError(_)))));
}
