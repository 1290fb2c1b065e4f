//! Inline menu rendering and callback action parsing.

use crate::telegram::InlineButton;
use arvox_core::{models, SessionSnapshot};

/// Temperature choices offered in the settings menu.
pub const TEMPERATURE_PRESETS: &[f64] = &[0.2, 0.5, 0.7, 1.0];

/// Max-token choices offered in the settings menu.
pub const MAX_TOKEN_PRESETS: &[u32] = &[500, 1000, 1500, 2000];

/// Parsed callback action from an inline button.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    ClearHistory,
    Status,
    SelectModel,
    Settings,
    SetModel(String),
    SetTemperature(f64),
    SetMaxTokens(u32),
    BackToMain,
}

impl MenuAction {
    /// Parse the `callback_data` string of an inline button.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "clear_history" => return Some(Self::ClearHistory),
            "status" => return Some(Self::Status),
            "select_model" => return Some(Self::SelectModel),
            "settings" => return Some(Self::Settings),
            "back_to_main" => return Some(Self::BackToMain),
            _ => {}
        }

        if let Some(model) = data.strip_prefix("set_model:") {
            return Some(Self::SetModel(model.to_string()));
        }
        if let Some(value) = data.strip_prefix("set_temp:") {
            return value.parse().ok().map(Self::SetTemperature);
        }
        if let Some(value) = data.strip_prefix("set_tokens:") {
            return value.parse().ok().map(Self::SetMaxTokens);
        }

        None
    }

    /// Encode back into a `callback_data` string.
    pub fn encode(&self) -> String {
        match self {
            Self::ClearHistory => "clear_history".into(),
            Self::Status => "status".into(),
            Self::SelectModel => "select_model".into(),
            Self::Settings => "settings".into(),
            Self::SetModel(model) => format!("set_model:{model}"),
            Self::SetTemperature(value) => format!("set_temp:{value}"),
            Self::SetMaxTokens(value) => format!("set_tokens:{value}"),
            Self::BackToMain => "back_to_main".into(),
        }
    }
}

/// Greeting sent on `/start`.
pub fn welcome_text(first_name: Option<&str>) -> String {
    let greeting = match first_name {
        Some(name) => format!("Hi {name}! 👋\n\n"),
        None => String::new(),
    };
    format!(
        "{greeting}🤖 Welcome to <b>Arvox</b>!\n\n\
         I am an AI assistant that keeps the thread of our conversation \
         while answering your questions.\n\n\
         <b>What I can do:</b>\n\
         • Answer questions with conversation context\n\
         • Remember the last 10 exchanges\n\
         • Switch between several models\n\
         • Adjust temperature and reply length\n\n\
         Just send me a message to get started!"
    )
}

/// Reply to `/help`.
pub fn help_text() -> &'static str {
    "📚 <b>Arvox commands</b>\n\n\
     /start - show the welcome menu\n\
     /clear - clear conversation history\n\
     /model - choose a model\n\
     /help - show this help\n\n\
     Use the inline buttons to check status or tune temperature and reply length."
}

/// Main menu shown under the welcome message.
pub fn main_menu() -> Vec<Vec<InlineButton>> {
    vec![
        vec![
            InlineButton::new("🔄 Clear history", MenuAction::ClearHistory.encode()),
            InlineButton::new("📊 Status", MenuAction::Status.encode()),
        ],
        vec![
            InlineButton::new("🤖 Select model", MenuAction::SelectModel.encode()),
            InlineButton::new("⚙️ Settings", MenuAction::Settings.encode()),
        ],
    ]
}

/// One button per catalog model.
pub fn model_menu() -> Vec<Vec<InlineButton>> {
    models::AVAILABLE_MODELS
        .iter()
        .map(|(id, label)| {
            vec![InlineButton::new(
                format!("🤖 {label}"),
                MenuAction::SetModel((*id).to_string()).encode(),
            )]
        })
        .collect()
}

/// Settings submenu: temperature presets, token presets, back.
pub fn settings_menu() -> (String, Vec<Vec<InlineButton>>) {
    let text = "⚙️ <b>Settings</b>\n\n\
                🌡️ Temperature controls creativity (0.0 to 1.0)\n\
                📝 Max tokens bounds the reply length (up to 2000)"
        .to_string();

    let temperature_row = TEMPERATURE_PRESETS
        .iter()
        .map(|&value| InlineButton::new(format!("🌡️ {value}"), MenuAction::SetTemperature(value).encode()))
        .collect();

    let token_row = MAX_TOKEN_PRESETS
        .iter()
        .map(|&value| InlineButton::new(format!("📝 {value}"), MenuAction::SetMaxTokens(value).encode()))
        .collect();

    let back_row = vec![InlineButton::new("🔙 Back", MenuAction::BackToMain.encode())];

    (text, vec![temperature_row, token_row, back_row])
}

/// Row with a single back button, used under confirmations.
pub fn back_row() -> Vec<Vec<InlineButton>> {
    vec![vec![InlineButton::new(
        "🔙 Back",
        MenuAction::BackToMain.encode(),
    )]]
}

/// Status view rendered from a session snapshot.
pub fn status_text(snapshot: &SessionSnapshot) -> String {
    format!(
        "📊 <b>Current status</b>\n\n\
         🤖 Model: {}\n\
         💬 Exchanges: {}\n\
         🌡️ Temperature: {}\n\
         📝 Max tokens: {}",
        models::model_label(&snapshot.model),
        snapshot.exchange_count,
        snapshot.temperature,
        snapshot.max_tokens,
    )
}
