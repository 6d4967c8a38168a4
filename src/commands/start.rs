use crate::config::Config;
use crate::core::bridge::Bridge;
use crate::core::storage::Storage;
use crate::notify::{Notifier, telegram::TelegramBot};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub async fn handle_start_command(config: Config) -> Result<()> {
    let settings = config.bridge_settings()?;

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                cancel_on_signal.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    info!("Connecting to telegram...");
    let bot = TelegramBot::new(
        &config.telegram.api_url,
        settings.bot_token.clone(),
        settings.chat_id,
    )?;
    let me = bot
        .get_me()
        .await
        .context("Telegram did not accept the bot token")?;
    info!(
        "Logged in to Telegram as {}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let state_path = config.state_file_path();
    let mut storage = Storage::load(&state_path)
        .with_context(|| format!("Failed to load state from {}", state_path.display()))?;
    info!("Loaded {} known nodes from {}", storage.users.len(), state_path.display());

    let retry_delay = Duration::from_secs(config.service.retry_delay_secs);
    loop {
        let mut bridge = Bridge::new(&config, &bot, &mut storage, cancel.clone());
        if let Err(err) = bridge.run(&settings.ble_name, config.scan_timeout()).await {
            error!("Error running service: {}", err);
            if let Err(e) = bot
                .send_message(&format!("⚠️ Error running service: {}", err))
                .await
            {
                warn!("Could not report the error to Telegram: {}", e);
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(retry_delay) => {
                info!("Reconnecting to {}", settings.ble_name);
            }
        }
    }

    storage
        .save(&state_path)
        .with_context(|| format!("Failed to save state to {}", state_path.display()))?;
    info!("Bridge stopped");
    Ok(())
}
