//! Command handlers.
//!
//! Slash commands are parsed by teloxide; the English and Chinese aliases
//! (`/mute`, `/ban-me`, `禁言`, `全体禁言`, ...) go through [`alias_handler`].
//! Both end up in [`moderation::run_action`].

pub mod moderation;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use moderation::{Action, run_action};

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Moderation commands:")]
pub enum Command {
    #[command(description = "Mute a user: /ban <user> [duration]")]
    Ban,

    #[command(description = "Mute yourself: /banme [duration]")]
    Banme,

    #[command(description = "Unmute a user: /unban <user>")]
    Unban,

    #[command(description = "Delete the replied message")]
    Del,

    #[command(description = "Turn on whole-group mute")]
    Muteall,

    #[command(description = "Turn off whole-group mute")]
    Unmuteall,
}

impl From<Command> for Action {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Ban => Action::Ban,
            Command::Banme => Action::BanMe,
            Command::Unban => Action::Unban,
            Command::Del => Action::DeleteMessage,
            Command::Muteall => Action::MuteAll,
            Command::Unmuteall => Action::UnmuteAll,
        }
    }
}

/// Build the slash command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    teloxide::filter_command::<Command, _>().endpoint(handle_command)
}

async fn handle_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    cmd: Command,
) -> anyhow::Result<()> {
    run_action(bot, msg, state, cmd.into()).await
}

/// Build the alias handler for messages whose first word names a command.
pub fn alias_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(|msg: Message, state: AppState| {
        msg.text()
            .and_then(|t| t.split_whitespace().next())
            .and_then(|word| Action::from_alias(word, &state.bot_username))
    })
    .endpoint(run_action)
}
