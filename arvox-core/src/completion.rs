//! OpenAI-compatible chat completion client.
//!
//! Executes one request against `{base_url}/v1/chat/completions` with a
//! bounded timeout and classifies the outcome. The client performs no
//! retries and never touches session state; retry policy belongs to the
//! caller, and history is recorded by the dispatcher only after success.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock bound for one completion call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound completion request, serialized as-is onto the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

/// One message in the outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Classified failure from the completion endpoint. All kinds are
/// recoverable; callers surface `user_message` and move on.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The call did not complete within the bound. The in-flight request is
    /// abandoned; any eventual response is discarded.
    #[error("completion request timed out")]
    Timeout,

    /// Non-200 response from the endpoint.
    #[error("completion API returned status {status}")]
    Http { status: u16 },

    /// 200 response missing the expected choice/content shape.
    #[error("malformed completion response: {0}")]
    Malformed(String),

    /// Network-level failure (connection refused, DNS, TLS), distinct from
    /// timeout.
    #[error("transport error: {0}")]
    Transport(String),
}

impl CompletionError {
    /// Text shown to the end user in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => "⏱️ The request timed out. Please try again.".to_string(),
            Self::Http { status } => {
                format!("❌ The AI service returned an error ({status}). Please try again later.")
            }
            Self::Malformed(_) => {
                "❌ Something went wrong while reading the reply. Please try again.".to_string()
            }
            Self::Transport(_) => {
                "❌ Could not reach the AI service. Please try again later.".to_string()
            }
        }
    }
}

/// Seam for the outbound completion call, so the dispatcher can be exercised
/// without a network.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Execute one completion request. The full text is returned as one unit
    /// or not at all.
    async fn complete(&self, request: ChatRequest) -> Result<String, CompletionError>;
}

/// Production client for an OpenAI-compatible endpoint.
pub struct CompletionClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl CompletionClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(CONNECT_TIMEOUT.min(timeout))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn classify_send_error(error: reqwest::Error) -> CompletionError {
        if error.is_timeout() {
            CompletionError::Timeout
        } else if error.is_connect() {
            CompletionError::Transport(format!("connection failed: {error}"))
        } else {
            CompletionError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %request.model, "Completion API error");
            return Err(CompletionError::Http {
                status: status.as_u16(),
            });
        }

        let body: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::Malformed(e.to_string())
            }
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("no choices in response".to_string()))?;

        choice
            .message
            .content
            .ok_or_else(|| CompletionError::Malformed("choice missing message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_wire_format() {
        let request = ChatRequest {
            model: "llama3-70b".into(),
            messages: vec![
                ChatMessage::new("system", "You are Arvox."),
                ChatMessage::new("user", "Hello"),
            ],
            max_tokens: 1000,
            temperature: 0.7,
            top_p: 0.9,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3-70b");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["top_p"], 0.9);
    }

    #[test]
    fn response_deserializes() {
        let json = r#"{
            "choices": [{
                "message": {"content": "Hello!", "role": "assistant"},
                "finish_reason": "stop"
            }]
        }"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("Hello!"));
    }

    #[test]
    fn response_without_choices_deserializes_empty() {
        let response: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.choices.is_empty());
    }

    #[test]
    fn strips_trailing_slash() {
        let client = CompletionClient::new("https://api.groq.com/openai/", "key");
        assert_eq!(client.base_url, "https://api.groq.com/openai");
    }

    #[test]
    fn user_messages_are_present_for_all_kinds() {
        let errors = [
            CompletionError::Timeout,
            CompletionError::Http { status: 500 },
            CompletionError::Malformed("x".into()),
            CompletionError::Transport("y".into()),
        ];
        for error in errors {
            assert!(!error.user_message().is_empty());
        }
    }

    #[test]
    fn http_error_message_names_the_status() {
        let error = CompletionError::Http { status: 429 };
        assert!(error.user_message().contains("429"));
        assert!(error.to_string().contains("429"));
    }
}
