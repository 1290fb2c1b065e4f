//! Per-user session state.
//!
//! The store keys sessions by Telegram user id. Each session lives behind its
//! own `tokio::sync::Mutex` so concurrent events for one user cannot
//! interleave history mutation, while independent users proceed in parallel.
//! The map itself is a `DashMap`, so a first-contact insert is atomic even
//! under concurrent messages from the same user.

use crate::history::History;
use crate::models;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default bound on generated output length.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Hard ceiling for the max-token setting.
pub const MAX_TOKENS_CEILING: u32 = 2000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Recoverable session-level errors. State is left unchanged when one of
/// these is returned.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Temperature {0} is outside the valid range 0.0 to 1.0")]
    InvalidTemperature(f64),

    #[error("Max tokens {0} is outside the valid range 1 to {MAX_TOKENS_CEILING}")]
    InvalidMaxTokens(u32),
}

/// One user's conversation state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Telegram user id; immutable after creation.
    pub user_id: i64,
    /// Rolling conversation log.
    pub history: History,
    /// Selected completion model.
    pub model: String,
    /// Bound on generated output length.
    pub max_tokens: u32,
    /// Sampling temperature in [0.0, 1.0].
    pub temperature: f64,
}

impl Session {
    fn new(user_id: i64, default_model: &str) -> Self {
        Self {
            user_id,
            history: History::new(),
            model: default_model.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Read-only view of a session, for status rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub model: String,
    pub exchange_count: usize,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Partial update for generation parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamUpdate {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Single source of truth for per-user sessions.
pub struct SessionStore {
    sessions: DashMap<i64, Arc<Mutex<Session>>>,
    default_model: String,
}

impl SessionStore {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            default_model: default_model.into(),
        }
    }

    /// Get the session for a user, creating it with defaults on first
    /// contact. The entry API makes the insert atomic, so two concurrent
    /// first messages resolve to the same session.
    pub fn get_or_create(&self, user_id: i64) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(user_id)
            .or_insert_with(|| {
                tracing::debug!(user_id, "Creating session with defaults");
                Arc::new(Mutex::new(Session::new(user_id, &self.default_model)))
            })
            .clone()
    }

    /// Look up an existing session without creating one.
    pub fn get(&self, user_id: i64) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(&user_id).map(|entry| entry.clone())
    }

    /// Clear a user's history in place. Returns `false` when the user has no
    /// session yet; that is reported, not fatal.
    pub async fn reset_history(&self, user_id: i64) -> bool {
        match self.get(user_id) {
            Some(session) => {
                session.lock().await.history.clear();
                true
            }
            None => false,
        }
    }

    /// Select a model for a user. Unknown ids are rejected and the session is
    /// left unchanged.
    pub async fn set_model(&self, user_id: i64, model: &str) -> Result<(), SessionError> {
        if !models::is_known_model(model) {
            return Err(SessionError::UnknownModel(model.to_string()));
        }

        let session = self.get_or_create(user_id);
        session.lock().await.model = model.to_string();
        Ok(())
    }

    /// Partially update generation parameters. Both fields are validated
    /// before either is applied, so a rejected update changes nothing.
    pub async fn set_generation_params(
        &self,
        user_id: i64,
        update: ParamUpdate,
    ) -> Result<(), SessionError> {
        if let Some(temperature) = update.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err(SessionError::InvalidTemperature(temperature));
            }
        }
        if let Some(max_tokens) = update.max_tokens {
            if max_tokens == 0 || max_tokens > MAX_TOKENS_CEILING {
                return Err(SessionError::InvalidMaxTokens(max_tokens));
            }
        }

        let session = self.get_or_create(user_id);
        let mut guard = session.lock().await;
        if let Some(temperature) = update.temperature {
            guard.temperature = temperature;
        }
        if let Some(max_tokens) = update.max_tokens {
            guard.max_tokens = max_tokens;
        }
        Ok(())
    }

    /// Read-only snapshot for the status view.
    pub async fn snapshot(&self, user_id: i64) -> Option<SessionSnapshot> {
        let session = self.get(user_id)?;
        let guard = session.lock().await;
        Some(SessionSnapshot {
            model: guard.model.clone(),
            exchange_count: guard.history.exchange_count(),
            max_tokens: guard.max_tokens,
            temperature: guard.temperature,
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
