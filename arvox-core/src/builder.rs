//! Assembles completion requests from session state.
//!
//! Pure transformation, no I/O and no mutation: the history is appended only
//! after a successful completion, so a failed call leaves the session exactly
//! as it was.

use crate::completion::{ChatMessage, ChatRequest};
use crate::history::Role;
use crate::session::Session;

/// Fixed nucleus-sampling parameter sent with every request.
pub const TOP_P: f64 = 0.9;

/// Builds the ordered message list and generation parameters for one call.
pub struct RequestBuilder {
    system_prompt: String,
}

impl RequestBuilder {
    /// Create a builder with the standard persona and a response-language
    /// directive.
    pub fn new(reply_language: &str) -> Self {
        Self {
            system_prompt: format!(
                "You are Arvox, a helpful and friendly AI assistant. \
                 Always respond in {reply_language}."
            ),
        }
    }

    /// Create a builder with a fully custom system instruction.
    pub fn with_system_prompt(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    /// Compose a request: system instruction, then the session history in
    /// order, then the new user turn. Empty or whitespace-only `user_text`
    /// passes through unchanged; rejecting it is the caller's call.
    pub fn build(&self, session: &Session, user_text: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(session.history.len() + 2);

        messages.push(ChatMessage::new(
            Role::System.as_str(),
            self.system_prompt.as_str(),
        ));

        for exchange in session.history.entries() {
            messages.push(ChatMessage::new(
                exchange.role.as_str(),
                exchange.content.as_str(),
            ));
        }

        messages.push(ChatMessage::new(Role::User.as_str(), user_text));

        ChatRequest {
            model: session.model.clone(),
            messages,
            max_tokens: session.max_tokens,
            temperature: session.temperature,
            top_p: TOP_P,
        }
    }
}
