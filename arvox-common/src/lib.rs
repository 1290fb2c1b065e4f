//! Arvox Common - shared configuration and logging for the Arvox bot.
//!
//! This crate provides:
//! - Configuration types and loading (file + environment overrides)
//! - Logging setup with noise filtering

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod logging;

pub use config::{CompletionConfig, Config, ObservabilityConfig, TelegramConfig};
pub use logging::init_logging;
