//! Routes bot events into session operations and completion calls.
//!
//! Text messages go through a per-user mailbox: the first message from a user
//! spawns a worker task that drains that user's queue one message at a time,
//! so completions for one user always run in receipt order while independent
//! users proceed fully in parallel. Commands and button clicks are quick
//! session mutations and are handled on their own tasks.
//!
//! Nothing here is fatal: every failure is logged and surfaced to the acting
//! user as reply text, and the event loop keeps running.

use crate::event::BotEvent;
use crate::menu::{self, MenuAction};
use crate::telegram::Outbound;
use arvox_core::{
    CompletionBackend, ParamUpdate, RequestBuilder, SessionStore,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

struct InboundText {
    chat_id: i64,
    text: String,
}

pub struct Dispatcher {
    store: Arc<SessionStore>,
    backend: Arc<dyn CompletionBackend>,
    outbound: Arc<dyn Outbound>,
    builder: RequestBuilder,
    mailboxes: DashMap<i64, mpsc::UnboundedSender<InboundText>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<SessionStore>,
        backend: Arc<dyn CompletionBackend>,
        outbound: Arc<dyn Outbound>,
        builder: RequestBuilder,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            backend,
            outbound,
            builder,
            mailboxes: DashMap::new(),
        })
    }

    /// Route one event. Returns immediately; the work happens on tasks.
    pub fn dispatch(self: &Arc<Self>, event: BotEvent) {
        match event {
            BotEvent::Message {
                user_id,
                chat_id,
                text,
            } => self.enqueue_message(user_id, chat_id, text),
            BotEvent::Command {
                user_id,
                chat_id,
                name,
                first_name,
            } => {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    this.handle_command(user_id, chat_id, &name, first_name.as_deref())
                        .await;
                });
            }
            BotEvent::Callback {
                query_id,
                user_id,
                chat_id,
                message_id,
                action,
            } => {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    this.handle_callback(&query_id, user_id, chat_id, message_id, &action)
                        .await;
                });
            }
        }
    }

    /// Queue a text message on the user's mailbox, spawning the worker on
    /// first contact. The synchronous send preserves receipt order.
    fn enqueue_message(self: &Arc<Self>, user_id: i64, chat_id: i64, text: String) {
        let sender = self
            .mailboxes
            .entry(user_id)
            .or_insert_with(|| {
                let (tx, mut rx) = mpsc::unbounded_channel::<InboundText>();
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    while let Some(inbound) = rx.recv().await {
                        this.process_message(user_id, inbound.chat_id, &inbound.text)
                            .await;
                    }
                });
                tx
            })
            .clone();

        if sender.send(InboundText { chat_id, text }).is_err() {
            tracing::error!(user_id, "Mailbox worker is gone; dropping message");
        }
    }

    /// One full message round-trip: build, complete, record, reply.
    async fn process_message(&self, user_id: i64, chat_id: i64, text: &str) {
        if let Err(e) = self.outbound.send_typing(chat_id).await {
            tracing::debug!(user_id, error = %e, "Failed to send typing action");
        }

        let session = self.store.get_or_create(user_id);
        let request = {
            let guard = session.lock().await;
            self.builder.build(&guard, text)
        };

        match self.backend.complete(request).await {
            Ok(reply) => {
                {
                    let mut guard = session.lock().await;
                    guard.history.record(text, &reply);
                    tracing::info!(
                        user_id,
                        history_len = guard.history.len(),
                        "Completion recorded"
                    );
                }
                if let Err(e) = self.outbound.send_text(chat_id, &reply).await {
                    tracing::error!(user_id, error = %e, "Failed to deliver reply");
                }
            }
            Err(error) => {
                // Failed calls never touch history.
                tracing::warn!(user_id, error = %error, "Completion failed");
                if let Err(e) = self
                    .outbound
                    .send_text(chat_id, &error.user_message())
                    .await
                {
                    tracing::error!(user_id, error = %e, "Failed to deliver error reply");
                }
            }
        }
    }

    async fn handle_command(
        &self,
        user_id: i64,
        chat_id: i64,
        name: &str,
        first_name: Option<&str>,
    ) {
        let result = match name {
            "start" => {
                self.store.get_or_create(user_id);
                self.outbound
                    .send_menu(chat_id, &menu::welcome_text(first_name), menu::main_menu())
                    .await
                    .map(|_| ())
            }
            "clear" => {
                let text = if self.store.reset_history(user_id).await {
                    "✅ Conversation history cleared."
                } else {
                    "There is no conversation to clear yet."
                };
                self.outbound.send_text(chat_id, text).await
            }
            "model" => {
                self.outbound
                    .send_menu(chat_id, "🤖 Choose a model:", menu::model_menu())
                    .await
                    .map(|_| ())
            }
            _ => self.outbound.send_text(chat_id, menu::help_text()).await,
        };

        if let Err(e) = result {
            tracing::error!(user_id, command = name, error = %e, "Command handling failed");
        }
    }

    async fn handle_callback(
        &self,
        query_id: &str,
        user_id: i64,
        chat_id: i64,
        message_id: i64,
        action: &str,
    ) {
        let Some(action) = MenuAction::parse(action) else {
            tracing::warn!(user_id, action, "Unknown callback action");
            let _ = self
                .outbound
                .answer_callback(query_id, Some("Unknown action"))
                .await;
            return;
        };

        let result = match action {
            MenuAction::ClearHistory => {
                self.store.reset_history(user_id).await;
                self.ack(query_id, Some("History cleared")).await;
                self.outbound
                    .edit_menu(
                        chat_id,
                        message_id,
                        "✅ Conversation history cleared.",
                        menu::back_row(),
                    )
                    .await
            }
            MenuAction::Status => {
                let text = match self.store.snapshot(user_id).await {
                    Some(snapshot) => menu::status_text(&snapshot),
                    None => "No session yet. Send a message first!".to_string(),
                };
                self.ack(query_id, None).await;
                self.outbound
                    .edit_menu(chat_id, message_id, &text, menu::back_row())
                    .await
            }
            MenuAction::SelectModel => {
                self.ack(query_id, None).await;
                self.outbound
                    .edit_menu(chat_id, message_id, "🤖 Choose a model:", menu::model_menu())
                    .await
            }
            MenuAction::Settings => {
                let (text, buttons) = menu::settings_menu();
                self.ack(query_id, None).await;
                self.outbound
                    .edit_menu(chat_id, message_id, &text, buttons)
                    .await
            }
            MenuAction::SetModel(model) => match self.store.set_model(user_id, &model).await {
                Ok(()) => {
                    let label = arvox_core::model_label(&model);
                    self.ack(query_id, Some(&format!("Model {label} selected"))).await;
                    self.outbound
                        .edit_menu(
                            chat_id,
                            message_id,
                            &format!("✅ Model <b>{label}</b> selected."),
                            menu::back_row(),
                        )
                        .await
                }
                Err(error) => {
                    self.ack(query_id, Some(&error.to_string())).await;
                    Ok(())
                }
            },
            MenuAction::SetTemperature(value) => {
                self.apply_params(
                    query_id,
                    chat_id,
                    message_id,
                    user_id,
                    ParamUpdate {
                        temperature: Some(value),
                        ..Default::default()
                    },
                    &format!("✅ Temperature set to {value}."),
                )
                .await
            }
            MenuAction::SetMaxTokens(value) => {
                self.apply_params(
                    query_id,
                    chat_id,
                    message_id,
                    user_id,
                    ParamUpdate {
                        max_tokens: Some(value),
                        ..Default::default()
                    },
                    &format!("✅ Max tokens set to {value}."),
                )
                .await
            }
            MenuAction::BackToMain => {
                self.ack(query_id, None).await;
                self.outbound
                    .edit_menu(
                        chat_id,
                        message_id,
                        &menu::welcome_text(None),
                        menu::main_menu(),
                    )
                    .await
            }
        };

        if let Err(e) = result {
            tracing::error!(user_id, error = %e, "Callback handling failed");
        }
    }

    async fn apply_params(
        &self,
        query_id: &str,
        chat_id: i64,
        message_id: i64,
        user_id: i64,
        update: ParamUpdate,
        confirmation: &str,
    ) -> crate::telegram::ChannelResult<()> {
        match self.store.set_generation_params(user_id, update).await {
            Ok(()) => {
                self.ack(query_id, None).await;
                self.outbound
                    .edit_menu(chat_id, message_id, confirmation, menu::back_row())
                    .await
            }
            Err(error) => {
                // Rejected updates leave the session unchanged.
                self.ack(query_id, Some(&error.to_string())).await;
                Ok(())
            }
        }
    }

    async fn ack(&self, query_id: &str, text: Option<&str>) {
        if let Err(e) = self.outbound.answer_callback(query_id, text).await {
            tracing::debug!(error = %e, "Failed to answer callback query");
        }
    }
}
