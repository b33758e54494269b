//! Wordguard - blocklist moderation for group chats.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration and the JSON rules file
//! - `moderation` - Platform-independent matcher, commands and timers
//! - `cache` - Moka-backed typed caches
//! - `permissions` - Authority levels and cached member roles
//! - `bot` - Telegram adapter, dispatcher and runtime
//! - `events` - Blocklist filter run before commands
//! - `plugins` - Command handlers
//! - `i18n` - Embedded reply catalogues
//! - `utils` - Duration parsing, target resolution

mod bot;
mod cache;
mod config;
mod events;
mod i18n;
mod moderation;
mod permissions;
mod plugins;
mod utils;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, PluginConfig, SharedConfig};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wordguard=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Wordguard...");

    i18n::init();

    let config = Config::from_env()?;
    info!("Bot mode: {:?}", config.bot_mode);

    let rules = SharedConfig::new(PluginConfig::load(&config.rules_path)?);
    bot::reload_on_hangup(config.rules_path.clone(), rules.clone());

    // Throttle keeps us inside Telegram's per-chat and global rate limits
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!("Using bot username: @{}", bot_username);

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let dispatcher =
        bot::build_dispatcher(bot.clone(), rules, config.owner_ids.clone(), bot_username);

    bot::run(&config, bot, dispatcher).await
}
