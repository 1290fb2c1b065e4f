//! Integration tests for the completion client against a stubbed HTTP API.

use arvox_core::{ChatMessage, ChatRequest, CompletionBackend, CompletionClient, CompletionError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_request() -> ChatRequest {
    ChatRequest {
        model: "llama3-70b".into(),
        messages: vec![
            ChatMessage::new("system", "You are Arvox."),
            ChatMessage::new("user", "hello"),
        ],
        max_tokens: 1000,
        temperature: 0.7,
        top_p: 0.9,
    }
}

#[tokio::test]
async fn successful_completion_returns_choice_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama3-70b",
            "top_p": 0.9
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "hi there"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new(&server.uri(), "test-key");
    let reply = client.complete(sample_request()).await.unwrap();
    assert_eq!(reply, "hi there");
}

#[tokio::test]
async fn non_200_is_classified_as_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = CompletionClient::new(&server.uri(), "test-key");
    let error = client.complete(sample_request()).await.unwrap_err();
    assert!(matches!(error, CompletionError::Http { status: 503 }));
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = CompletionClient::new(&server.uri(), "test-key");
    let error = client.complete(sample_request()).await.unwrap_err();
    assert!(matches!(error, CompletionError::Malformed(_)));
}

#[tokio::test]
async fn missing_content_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant"}}]
        })))
        .mount(&server)
        .await;

    let client = CompletionClient::new(&server.uri(), "test-key");
    let error = client.complete(sample_request()).await.unwrap_err();
    assert!(matches!(error, CompletionError::Malformed(_)));
}

#[tokio::test]
async fn non_json_200_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = CompletionClient::new(&server.uri(), "test-key");
    let error = client.complete(sample_request()).await.unwrap_err();
    assert!(matches!(error, CompletionError::Malformed(_)));
}

#[tokio::test]
async fn slow_response_is_classified_as_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "too late"}}]
                })),
        )
        .mount(&server)
        .await;

    let client = CompletionClient::with_timeout(&server.uri(), "test-key", Duration::from_millis(50));
    let error = client.complete(sample_request()).await.unwrap_err();
    assert!(matches!(error, CompletionError::Timeout));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Bind a server to learn a free port, then shut it down.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let client = CompletionClient::with_timeout(&uri, "test-key", Duration::from_secs(2));
    let error = client.complete(sample_request()).await.unwrap_err();
    assert!(matches!(error, CompletionError::Transport(_)));
}
