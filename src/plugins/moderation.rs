//! Moderation command glue: Telegram message in, [`Moderator`] call, reply out.
//!
//! [`Moderator`]: crate::moderation::Moderator

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::bot::telegram::PLATFORM;
use crate::moderation::{CommandContext, GroupIdentity, Member};
use crate::utils::get_target_from_msg;

/// The six moderation commands, whatever name they were invoked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ban,
    BanMe,
    Unban,
    DeleteMessage,
    MuteAll,
    UnmuteAll,
}

impl Action {
    /// Match the first word of a message against the command aliases.
    ///
    /// Chinese aliases work with or without a leading `/`; English ones need
    /// it. `/alias@other_bot` is ignored.
    pub fn from_alias(word: &str, bot_username: &str) -> Option<Self> {
        let (slashed, name) = match word.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, word),
        };
        let name = match name.split_once('@') {
            Some((name, bot)) if bot.eq_ignore_ascii_case(bot_username) => name,
            Some(_) => return None,
            None => name,
        };

        match name {
            "禁言" => Some(Self::Ban),
            "禁我" => Some(Self::BanMe),
            "解禁" | "解除禁言" => Some(Self::Unban),
            "撤回" => Some(Self::DeleteMessage),
            "全体禁言" => Some(Self::MuteAll),
            "解除全体禁言" | "全体解禁" => Some(Self::UnmuteAll),
            _ if !slashed => None,
            "mute" => Some(Self::Ban),
            "ban-me" | "mute-me" => Some(Self::BanMe),
            "unmute" => Some(Self::Unban),
            "recall" | "delete-message" => Some(Self::DeleteMessage),
            "mute-all" => Some(Self::MuteAll),
            "unmute-all" => Some(Self::UnmuteAll),
            _ => None,
        }
    }
}

/// Run a moderation command and post its reply.
pub async fn run_action(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    action: Action,
) -> anyhow::Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    let config = state.config.snapshot();
    let chat = msg.chat.id.to_string();
    let ctx = CommandContext {
        identity: GroupIdentity::new(PLATFORM, chat.clone()),
        channel_id: chat,
        invoker: Member {
            id: from.id.to_string(),
            name: from.first_name.clone(),
        },
        authority: state.permissions.authority(&config, from.id),
        locale: state.locale(&config, &msg),
        quoted_message: msg.reply_to_message().map(|r| r.id.0.to_string()),
    };

    let args: Vec<&str> = msg.text().unwrap_or("").split_whitespace().skip(1).collect();
    let moderator = &state.moderator;

    let reply = match action {
        Action::Ban => {
            let (target, duration) = split_target(&msg, &args);
            moderator.ban(&config, &ctx, target, duration.as_deref()).await?
        }
        Action::BanMe => moderator.ban_me(&config, &ctx, joined(&args).as_deref()).await?,
        Action::Unban => {
            let (target, _) = split_target(&msg, &args);
            moderator.unban(&config, &ctx, target).await?
        }
        Action::DeleteMessage => moderator.delete_message(&config, &ctx).await?,
        Action::MuteAll => moderator.set_mute_all(&config, &ctx, true).await?,
        Action::UnmuteAll => moderator.set_mute_all(&config, &ctx, false).await?,
    };

    if let Some(text) = reply {
        bot.send_message(msg.chat.id, text)
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
    }

    Ok(())
}

/// Target member and whatever text follows it.
fn split_target(msg: &Message, args: &[&str]) -> (Option<Member>, Option<String>) {
    match get_target_from_msg(msg, args) {
        Some((member, used)) => (Some(member), joined(&args[used..])),
        None => (None, joined(args)),
    }
}

fn joined(args: &[&str]) -> Option<String> {
    (!args.is_empty()).then(|| args.join(" "))
}
