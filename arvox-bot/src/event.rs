//! Typed events parsed from Telegram updates.
//!
//! The dispatcher only ever sees these shapes; everything Telegram-specific
//! about the update JSON stays in this module and the `telegram` adapter.

use serde_json::Value;

/// One inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// A `/command` message.
    Command {
        user_id: i64,
        chat_id: i64,
        name: String,
        /// Sender's first name, used for the welcome greeting.
        first_name: Option<String>,
    },
    /// A plain text message.
    Message {
        user_id: i64,
        chat_id: i64,
        text: String,
    },
    /// An inline-keyboard button click.
    Callback {
        query_id: String,
        user_id: i64,
        chat_id: i64,
        message_id: i64,
        action: String,
    },
}

impl BotEvent {
    pub fn user_id(&self) -> i64 {
        match self {
            Self::Command { user_id, .. }
            | Self::Message { user_id, .. }
            | Self::Callback { user_id, .. } => *user_id,
        }
    }
}

/// An event together with the sender's username, which the adapter needs for
/// allow-list filtering.
#[derive(Debug, Clone)]
pub struct ParsedUpdate {
    pub event: BotEvent,
    pub username: Option<String>,
}

/// Parse one entry from a `getUpdates` result array. Returns `None` for
/// update kinds the bot does not handle (edits, stickers, joins, ...).
pub fn parse_update(update: &Value) -> Option<ParsedUpdate> {
    if let Some(callback) = update.get("callback_query") {
        return parse_callback_query(callback);
    }

    let message = update.get("message")?;
    let from = message.get("from")?;
    let user_id = from.get("id").and_then(Value::as_i64)?;
    let username = from
        .get("username")
        .and_then(Value::as_str)
        .map(String::from);
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?;
    let text = message.get("text").and_then(Value::as_str)?;

    let event = if let Some(command) = parse_command_name(text) {
        BotEvent::Command {
            user_id,
            chat_id,
            name: command,
            first_name: from
                .get("first_name")
                .and_then(Value::as_str)
                .map(String::from),
        }
    } else {
        BotEvent::Message {
            user_id,
            chat_id,
            text: text.to_string(),
        }
    };

    Some(ParsedUpdate { event, username })
}

/// Extract the command name from `/name@botname args`, if the text is a
/// command at all.
fn parse_command_name(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let first_token = rest.split_whitespace().next()?;
    let name = first_token.split('@').next().unwrap_or(first_token);
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

fn parse_callback_query(callback: &Value) -> Option<ParsedUpdate> {
    let query_id = callback.get("id")?.as_str()?.to_string();
    let action = callback.get("data")?.as_str()?.to_string();

    let from = callback.get("from")?;
    let user_id = from.get("id").and_then(Value::as_i64)?;
    let username = from
        .get("username")
        .and_then(Value::as_str)
        .map(String::from);

    let message = callback.get("message")?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?;
    let message_id = message.get("message_id").and_then(Value::as_i64)?;

    Some(ParsedUpdate {
        event: BotEvent::Callback {
            query_id,
            user_id,
            chat_id,
            message_id,
            action,
        },
        username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_message() {
        let update = json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": {"id": 111, "username": "alice", "first_name": "Alice"},
                "chat": {"id": 222},
                "text": "hello there"
            }
        });

        let parsed = parse_update(&update).unwrap();
        assert_eq!(parsed.username.as_deref(), Some("alice"));
        assert_eq!(
            parsed.event,
            BotEvent::Message {
                user_id: 111,
                chat_id: 222,
                text: "hello there".into()
            }
        );
    }

    #[test]
    fn parses_command_with_bot_suffix() {
        let update = json!({
            "message": {
                "from": {"id": 1, "first_name": "Bob"},
                "chat": {"id": 2},
                "text": "/start@arvox_bot"
            }
        });

        let parsed = parse_update(&update).unwrap();
        assert_eq!(
            parsed.event,
            BotEvent::Command {
                user_id: 1,
                chat_id: 2,
                name: "start".into(),
                first_name: Some("Bob".into())
            }
        );
    }

    #[test]
    fn parses_callback_query() {
        let update = json!({
            "callback_query": {
                "id": "cb-1",
                "data": "set_model:llama3-8b",
                "from": {"id": 5, "username": "carol"},
                "message": {"message_id": 77, "chat": {"id": 6}}
            }
        });

        let parsed = parse_update(&update).unwrap();
        assert_eq!(
            parsed.event,
            BotEvent::Callback {
                query_id: "cb-1".into(),
                user_id: 5,
                chat_id: 6,
                message_id: 77,
                action: "set_model:llama3-8b".into()
            }
        );
    }

    #[test]
    fn ignores_non_text_updates() {
        let update = json!({
            "message": {
                "from": {"id": 1},
                "chat": {"id": 2},
                "sticker": {"file_id": "abc"}
            }
        });
        assert!(parse_update(&update).is_none());

        let edited = json!({"edited_message": {"text": "x"}});
        assert!(parse_update(&edited).is_none());
    }

    #[test]
    fn bare_slash_is_not_a_command() {
        assert!(parse_command_name("/").is_none());
        assert_eq!(parse_command_name("/help extra"), Some("help".into()));
        assert!(parse_command_name("hello").is_none());
    }
}
