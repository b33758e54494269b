//! Bot runtime - Polling and Webhook runners, plus rules reloading.

use std::path::PathBuf;

use teloxide::prelude::*;
use tracing::info;

use super::dispatcher::ThrottledBot;
use super::webhook;
use crate::config::{BotMode, Config, SharedConfig};

/// Run the bot with the configured mode.
pub async fn run(
    config: &Config,
    bot: ThrottledBot,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
) -> anyhow::Result<()> {
    match config.bot_mode {
        BotMode::Polling => {
            info!("Starting bot in polling mode...");
            dispatcher.dispatch().await;
            Ok(())
        }
        BotMode::Webhook => {
            info!("Starting bot in webhook mode...");
            webhook::start_webhook(config, dispatcher, bot).await
        }
    }
}

/// Reload the rules file whenever the process receives SIGHUP.
///
/// A file that fails to load leaves the current rules in place.
#[cfg(unix)]
pub fn reload_on_hangup(path: PathBuf, config: SharedConfig) {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::{error, warn};

    use crate::config::PluginConfig;

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Cannot listen for SIGHUP, rules reload disabled: {}", e);
                return;
            }
        };

        while hangups.recv().await.is_some() {
            match PluginConfig::load(&path) {
                Ok(next) => {
                    config.replace(next);
                    info!("Rules reloaded from {}", path.display());
                }
                Err(e) => error!("Rules reload failed, keeping previous rules: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
pub fn reload_on_hangup(_path: PathBuf, _config: SharedConfig) {}
