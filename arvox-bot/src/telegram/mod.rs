//! Telegram Bot API adapter.
//!
//! Long-polls `getUpdates` for inbound events and sends replies back through
//! `sendMessage` and friends. Replies are converted to Telegram HTML and
//! chunked at the platform's message-size limit.

pub mod format;

use crate::event::{self, BotEvent};
use async_trait::async_trait;
use serde_json::Value;

/// Telegram's hard limit on message length.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Channel error type.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Outbound side of the channel, the seam the dispatcher talks through.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send plain/Markdown text, chunked as needed.
    async fn send_text(&self, chat_id: i64, text: &str) -> ChannelResult<()>;

    /// Send a message with an inline keyboard; returns the new message id.
    async fn send_menu(
        &self,
        chat_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> ChannelResult<i64>;

    /// Replace the text of an existing message.
    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> ChannelResult<()>;

    /// Replace the text and keyboard of an existing message.
    async fn edit_menu(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> ChannelResult<()>;

    /// Acknowledge an inline button click.
    async fn answer_callback(&self, query_id: &str, text: Option<&str>) -> ChannelResult<()>;

    /// Show the "typing..." chat action.
    async fn send_typing(&self, chat_id: i64) -> ChannelResult<()>;
}

/// Telegram channel - long-polls the Bot API for updates.
pub struct TelegramBot {
    bot_token: String,
    allowed_users: Vec<String>,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramBot {
    pub fn new(bot_token: String, allowed_users: Vec<String>, poll_timeout_secs: u64) -> Self {
        Self {
            bot_token,
            allowed_users,
            poll_timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    fn is_user_allowed(&self, identity: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == identity)
    }

    fn is_any_identity_allowed(&self, user_id: i64, username: Option<&str>) -> bool {
        let id = user_id.to_string();
        self.is_user_allowed(&id) || username.is_some_and(|name| self.is_user_allowed(name))
    }

    /// Verify the bot token by calling `getMe`.
    pub async fn init(&self) -> ChannelResult<()> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Auth(format!("Invalid bot token: {err}")));
        }

        tracing::info!("Telegram bot initialized");
        Ok(())
    }

    /// Fetch one batch of updates. Returns the next poll offset together with
    /// the parsed events from authorized senders.
    pub async fn get_updates(&self, offset: i64) -> ChannelResult<(i64, Vec<BotEvent>)> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message", "callback_query"]
        });

        let resp = self
            .client
            .post(self.api_url("getUpdates"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;

        let data: Value = resp
            .json()
            .await
            .map_err(|e| ChannelError::InvalidMessage(e.to_string()))?;

        let mut next_offset = offset;
        let mut events = Vec::new();

        if let Some(results) = data.get("result").and_then(Value::as_array) {
            for update in results {
                if let Some(update_id) = update.get("update_id").and_then(Value::as_i64) {
                    next_offset = next_offset.max(update_id + 1);
                }

                let Some(parsed) = event::parse_update(update) else {
                    continue;
                };

                let user_id = parsed.event.user_id();
                if !self.is_any_identity_allowed(user_id, parsed.username.as_deref()) {
                    tracing::warn!(
                        user_id,
                        username = parsed.username.as_deref().unwrap_or("unknown"),
                        "Ignoring update from unauthorized user"
                    );
                    continue;
                }

                events.push(parsed.event);
            }
        }

        Ok((next_offset, events))
    }

    /// Send a single message chunk with HTML parsing, falling back to plain
    /// text when Telegram rejects the entities.
    async fn send_single_chunk(&self, chat_id: i64, message: &str) -> ChannelResult<()> {
        let converted = format::convert_to_telegram_html(message);

        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": converted,
            "parse_mode": "HTML"
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let error_text = resp.text().await.unwrap_or_default();

        // Telegram returns "Bad Request: can't parse entities" for HTML errors
        if status.as_u16() == 400 && error_text.contains("parse entities") {
            tracing::warn!(
                "Telegram HTML parsing failed, retrying without parse_mode: {}",
                error_text
            );

            let body_plain = serde_json::json!({
                "chat_id": chat_id,
                "text": message
            });

            let resp_plain = self
                .client
                .post(self.api_url("sendMessage"))
                .json(&body_plain)
                .send()
                .await
                .map_err(|e| ChannelError::Connection(e.to_string()))?;

            if resp_plain.status().is_success() {
                return Ok(());
            }

            let plain_error = resp_plain.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed(plain_error));
        }

        Err(ChannelError::SendFailed(error_text))
    }

    fn keyboard_json(buttons: Vec<Vec<InlineButton>>) -> Value {
        let keyboard: Vec<Vec<Value>> = buttons
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|btn| {
                        serde_json::json!({
                            "text": btn.text,
                            "callback_data": btn.callback_data
                        })
                    })
                    .collect()
            })
            .collect();
        serde_json::json!({ "inline_keyboard": keyboard })
    }

    async fn post_api(&self, method: &str, body: Value) -> ChannelResult<Value> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed(format!("{method} failed: {err}")));
        }

        resp.json()
            .await
            .map_err(|e| ChannelError::InvalidMessage(e.to_string()))
    }
}

#[async_trait]
impl Outbound for TelegramBot {
    async fn send_text(&self, chat_id: i64, text: &str) -> ChannelResult<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.send_single_chunk(chat_id, &chunk).await?;
        }
        Ok(())
    }

    async fn send_menu(
        &self,
        chat_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> ChannelResult<i64> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "reply_markup": Self::keyboard_json(buttons)
        });

        let data = self.post_api("sendMessage", body).await?;
        data.get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| ChannelError::InvalidMessage("Missing message_id in response".into()))
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> ChannelResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML"
        });
        self.post_api("editMessageText", body).await.map(|_| ())
    }

    async fn edit_menu(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> ChannelResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
            "reply_markup": Self::keyboard_json(buttons)
        });
        self.post_api("editMessageText", body).await.map(|_| ())
    }

    async fn answer_callback(&self, query_id: &str, text: Option<&str>) -> ChannelResult<()> {
        let mut body = serde_json::json!({
            "callback_query_id": query_id,
            "show_alert": false
        });
        if let Some(t) = text {
            body["text"] = Value::String(t.to_string());
        }
        self.post_api("answerCallbackQuery", body).await.map(|_| ())
    }

    async fn send_typing(&self, chat_id: i64) -> ChannelResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": "typing"
        });
        self.post_api("sendChatAction", body).await.map(|_| ())
    }
}

/// Split a message into chunks that fit within Telegram's limit, preferring
/// paragraph, line, sentence, and word boundaries in that order.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let boundary = (0..=max_len)
            .rev()
            .find(|&i| remaining.is_char_boundary(i))
            .unwrap_or(0);
        let window = &remaining[..boundary];
        let split_pos = window
            .rfind("\n\n")
            .or_else(|| window.rfind('\n'))
            .or_else(|| window.rfind(". "))
            .or_else(|| window.rfind(' '))
            .filter(|&pos| pos > 0)
            .unwrap_or(boundary);

        chunks.push(remaining[..split_pos].to_string());
        remaining = remaining[split_pos..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_includes_token_and_method() {
        let bot = TelegramBot::new("123:ABC".into(), vec![], 30);
        assert_eq!(
            bot.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    #[test]
    fn wildcard_allows_anyone() {
        let bot = TelegramBot::new("t".into(), vec!["*".into()], 30);
        assert!(bot.is_any_identity_allowed(12345, None));
    }

    #[test]
    fn allow_list_matches_username_or_id() {
        let bot = TelegramBot::new("t".into(), vec!["alice".into(), "999".into()], 30);
        assert!(bot.is_any_identity_allowed(1, Some("alice")));
        assert!(bot.is_any_identity_allowed(999, None));
        assert!(!bot.is_any_identity_allowed(1, Some("eve")));
    }

    #[test]
    fn split_message_short() {
        let result = split_message("Hello, World!", MAX_MESSAGE_LEN);
        assert_eq!(result, vec!["Hello, World!"]);
    }

    #[test]
    fn split_message_long() {
        let msg = "x".repeat(5000);
        let result = split_message(&msg, MAX_MESSAGE_LEN);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.len() <= MAX_MESSAGE_LEN));
        assert_eq!(result.concat().len(), 5000);
    }

    #[test]
    fn split_message_prefers_paragraph_boundary() {
        let msg = format!("{}\n\n{}", "a".repeat(50), "b".repeat(50));
        let result = split_message(&msg, 80);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].trim_end(), "a".repeat(50));
        assert_eq!(result[1], "b".repeat(50));
    }

    #[test]
    fn split_message_never_splits_inside_char() {
        // Multi-byte characters near the boundary must not panic.
        let msg = "پ".repeat(3000);
        let result = split_message(&msg, MAX_MESSAGE_LEN);
        assert!(result.len() >= 2);
        assert_eq!(result.concat(), msg);
    }
}
