//! Arvox Core - session state and completion plumbing for the Arvox bot.
//!
//! This crate holds the pieces with design substance:
//! - [`session::SessionStore`] - per-user conversation state, safely shared
//! - [`history::History`] - rolling exchange log with FIFO capacity
//! - [`builder::RequestBuilder`] - pure assembly of completion requests
//! - [`completion::CompletionClient`] - the outbound call with timeout and
//!   error classification
//!
//! The Telegram-facing glue lives in `arvox-bot`; nothing in this crate does
//! platform I/O besides the completion HTTP call.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod builder;
pub mod completion;
pub mod history;
pub mod models;
pub mod session;

// Re-export commonly used types
pub use builder::RequestBuilder;
pub use completion::{
    ChatMessage, ChatRequest, CompletionBackend, CompletionClient, CompletionError,
};
pub use history::{Exchange, History, Role, HISTORY_CAP};
pub use models::{is_known_model, model_label, AVAILABLE_MODELS};
pub use session::{ParamUpdate, Session, SessionError, SessionSnapshot, SessionStore};
