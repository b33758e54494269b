//! Message dispatcher setup.
//!
//! Every group message first passes the blocklist; only messages that get
//! through reach the command handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use super::telegram::TelegramApi;
use crate::config::{PluginConfig, SharedConfig};
use crate::events;
use crate::i18n::resolve_locale;
use crate::moderation::{Moderator, RuleMatcher};
use crate::permissions::Permissions;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Reloadable rules; take a snapshot per update.
    pub config: SharedConfig,

    /// Authority and cached member roles.
    pub permissions: Permissions,

    pub matcher: RuleMatcher,

    /// Command logic bound to the Telegram API.
    pub moderator: Moderator,

    /// Bot username (without @), used to strip `/cmd@bot` suffixes.
    pub bot_username: String,
}

impl AppState {
    pub fn new(
        bot: ThrottledBot,
        config: SharedConfig,
        owner_ids: Vec<u64>,
        bot_username: String,
    ) -> Self {
        // Permissions needs the inner Bot for API calls
        let permissions = Permissions::with_owners(bot.inner().clone(), owner_ids);
        let api = Arc::new(TelegramApi::new(bot, permissions.clone()));

        Self {
            config,
            permissions,
            matcher: RuleMatcher::new(),
            moderator: Moderator::new(api),
            bot_username,
        }
    }

    /// Reply locale for a message.
    pub fn locale(&self, config: &PluginConfig, msg: &Message) -> String {
        resolve_locale(
            config.locale.as_deref(),
            msg.from.as_ref().and_then(|u| u.language_code.as_deref()),
        )
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    config: SharedConfig,
    owner_ids: Vec<u64>,
    bot_username: String,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let state = AppState::new(bot.clone(), config, owner_ids, bot_username);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    let message_handler = Update::filter_message()
        .filter(|msg: Message| msg.chat.is_group() || msg.chat.is_supergroup())
        .filter_async(events::passes_blocklist)
        .branch(plugins::command_handler())
        .branch(plugins::alias_handler());

    // Private chats, blocked messages and plain chatter end up here
    dptree::entry()
        .branch(message_handler)
        .branch(events::unhandled_handler())
}
