//! Conversation history with FIFO capacity enforcement.

use serde::{Deserialize, Serialize};

/// Maximum retained history entries (10 user/assistant exchanges).
pub const HISTORY_CAP: usize = 20;

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Get the role as the wire-format string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub role: Role,
    pub content: String,
}

impl Exchange {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Rolling conversation log. Entries are kept in insertion order and the
/// oldest ones are evicted once the cap is exceeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History(Vec<Exchange>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Completed user/assistant exchanges.
    pub fn exchange_count(&self) -> usize {
        self.0.len() / 2
    }

    pub fn entries(&self) -> &[Exchange] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Append a completed exchange and enforce the cap.
    ///
    /// Only called after a successful completion; failure paths leave the
    /// history untouched. Eviction drops the single oldest entry until the
    /// length is back under [`HISTORY_CAP`], which in practice removes whole
    /// pairs because appends are pair-wise.
    pub fn record(&mut self, user_text: &str, assistant_text: &str) {
        self.0.push(Exchange::new(Role::User, user_text));
        self.0.push(Exchange::new(Role::Assistant, assistant_text));

        while self.0.len() > HISTORY_CAP {
            self.0.remove(0);
        }
    }
}
