//! Configuration for the Arvox bot.
//!
//! Configuration is loaded from `~/.arvox/config.json` when present and then
//! overlaid with environment variables, so deployments can run entirely from
//! the environment (no config file required).
//!
//! Credentials (bot token, completion API key) are treated as opaque: they are
//! carried through to the HTTP clients and never logged.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory (`~/.arvox`).
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".arvox"),
        |dirs| dirs.home_dir().join(".arvox"),
    )
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Telegram channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    #[serde(default)]
    pub bot_token: String,

    /// Usernames or numeric user ids allowed to talk to the bot.
    /// `*` allows everyone.
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,

    /// Long-poll timeout passed to `getUpdates`, in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            allowed_users: default_allowed_users(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

/// Completion endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// API key for the completion endpoint.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible endpoint. The client appends
    /// `/v1/chat/completions`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for sessions that have not picked one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Language the assistant is instructed to reply in.
    #[serde(default = "default_reply_language")]
    pub reply_language: String,

    /// Wall-clock bound for one completion call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            default_model: default_model(),
            reply_language: default_reply_language(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_allowed_users() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_base_url() -> String {
    "https://api.groq.com/openai".to_string()
}

fn default_model() -> String {
    "llama3-70b".to_string()
}

fn default_reply_language() -> String {
    "Persian".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from the default location with environment
    /// overrides applied.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_dir().join("config.json"))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file. Missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(users) = std::env::var("ARVOX_ALLOWED_USERS") {
            self.telegram.allowed_users = users
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.completion.api_key = key;
        }
        if let Ok(url) = std::env::var("ARVOX_BASE_URL") {
            self.completion.base_url = url;
        }
        if let Ok(model) = std::env::var("ARVOX_MODEL") {
            self.completion.default_model = model;
        }
        if let Ok(language) = std::env::var("ARVOX_REPLY_LANGUAGE") {
            self.completion.reply_language = language;
        }
        if let Ok(level) = std::env::var("ARVOX_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("ARVOX_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }

    /// Check that the credentials required to run are present.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            bail!("Telegram bot token is not set (TELEGRAM_TOKEN or telegram.bot_token)");
        }
        if self.completion.api_key.is_empty() {
            bail!("Completion API key is not set (GROQ_API_KEY or completion.api_key)");
        }
        Ok(())
    }
}
