use anyhow::Result;
use arvox_bot::{Dispatcher, TelegramBot};
use arvox_common::{init_logging, Config};
use arvox_core::{CompletionClient, RequestBuilder, SessionStore};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    config.validate()?;

    tracing::info!(
        model = %config.completion.default_model,
        base_url = %config.completion.base_url,
        "Starting Arvox bot"
    );

    let bot = Arc::new(TelegramBot::new(
        config.telegram.bot_token.clone(),
        config.telegram.allowed_users.clone(),
        config.telegram.poll_timeout_secs,
    ));
    bot.init().await?;

    let store = Arc::new(SessionStore::new(&config.completion.default_model));
    let client = Arc::new(CompletionClient::with_timeout(
        &config.completion.base_url,
        &config.completion.api_key,
        Duration::from_secs(config.completion.request_timeout_secs),
    ));
    let builder = RequestBuilder::new(&config.completion.reply_language);

    let dispatcher = Dispatcher::new(store, client, bot.clone(), builder);

    tracing::info!("Polling for updates (Ctrl+C to stop)");

    let mut offset: i64 = 0;
    loop {
        let batch = tokio::select! {
            result = bot.get_updates(offset) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        };

        match batch {
            Ok((next_offset, events)) => {
                offset = next_offset;
                for event in events {
                    dispatcher.dispatch(event);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Polling failed, backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }

    Ok(())
}
