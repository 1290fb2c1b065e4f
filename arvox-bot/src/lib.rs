//! Arvox Bot - Telegram front end for the Arvox conversational relay.
//!
//! The bot long-polls the Telegram Bot API for updates, turns them into typed
//! events, and routes them through the dispatcher into `arvox-core`:
//!
//! ```text
//! Telegram → getUpdates → BotEvent → Dispatcher → SessionStore
//!                                         ↓             ↓
//! User ←──── sendMessage ←──── reply ← CompletionClient
//! ```
//!
//! Replies are converted from Markdown to Telegram HTML and chunked at the
//! platform's 4096-character limit before sending.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod dispatcher;
pub mod event;
pub mod menu;
pub mod telegram;

// Re-export commonly used types
pub use dispatcher::Dispatcher;
pub use event::BotEvent;
pub use menu::MenuAction;
pub use telegram::{ChannelError, ChannelResult, InlineButton, Outbound, TelegramBot};
