//! Telegram implementation of the moderation host API.

use async_trait::async_trait;
use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{ChatPermissions, InputFile, InputMedia, InputMediaPhoto, MessageId, UserId};
use teloxide::RequestError;
use tracing::debug;

use super::dispatcher::ThrottledBot;
use crate::moderation::{
    ApiError, GroupIdentity, IncomingMessage, MemberRole, ModerationApi, PlatformFamily,
};
use crate::permissions::Permissions;

pub const PLATFORM: &str = "telegram";

/// Telegram treats restrictions shorter than this as permanent.
const MIN_RESTRICTION_MS: u64 = 30_000;

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        ApiError::Request(e.to_string())
    }
}

#[derive(Clone)]
pub struct TelegramApi {
    bot: ThrottledBot,
    permissions: Permissions,
}

impl TelegramApi {
    pub fn new(bot: ThrottledBot, permissions: Permissions) -> Self {
        Self { bot, permissions }
    }
}

fn chat_id(raw: &str) -> Result<ChatId, ApiError> {
    raw.parse::<i64>()
        .map(ChatId)
        .map_err(|_| ApiError::Request(format!("invalid chat id {raw:?}")))
}

fn user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse::<u64>()
        .map(UserId)
        .map_err(|_| ApiError::Request(format!("invalid user id {raw:?}")))
}

fn message_id(raw: &str) -> Result<MessageId, ApiError> {
    raw.parse::<i32>()
        .map(MessageId)
        .map_err(|_| ApiError::Request(format!("invalid message id {raw:?}")))
}

/// What an ordinary member may do once unmuted.
fn member_permissions() -> ChatPermissions {
    ChatPermissions::SEND_MESSAGES
        | ChatPermissions::SEND_AUDIOS
        | ChatPermissions::SEND_DOCUMENTS
        | ChatPermissions::SEND_PHOTOS
        | ChatPermissions::SEND_VIDEOS
        | ChatPermissions::SEND_VIDEO_NOTES
        | ChatPermissions::SEND_VOICE_NOTES
        | ChatPermissions::SEND_POLLS
        | ChatPermissions::SEND_OTHER_MESSAGES
        | ChatPermissions::ADD_WEB_PAGE_PREVIEWS
        | ChatPermissions::INVITE_USERS
}

/// Build the platform-neutral view of a group message.
pub fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let sender = msg.from.as_ref()?;
    let chat = msg.chat.id.to_string();

    Some(IncomingMessage {
        identity: GroupIdentity::new(PLATFORM, chat.clone()),
        channel_id: chat,
        message_id: msg.id.0.to_string(),
        sender_id: sender.id.to_string(),
        sender_name: sender.first_name.clone(),
        content: msg.text().or(msg.caption()).unwrap_or_default().to_string(),
        // largest size of the attached photo
        images: msg
            .photo()
            .and_then(|sizes| sizes.last())
            .map(|p| p.file.id.clone())
            .into_iter()
            .collect(),
    })
}

#[async_trait]
impl ModerationApi for TelegramApi {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ApiError> {
        self.bot.send_message(chat_id(channel_id)?, text).await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id_raw: &str) -> Result<(), ApiError> {
        self.bot
            .delete_message(chat_id(channel_id)?, message_id(message_id_raw)?)
            .await?;
        Ok(())
    }

    async fn mute_guild_member(
        &self,
        guild_id: &str,
        user_id_raw: &str,
        duration_ms: u64,
    ) -> Result<(), ApiError> {
        let chat = chat_id(guild_id)?;
        let user = user_id(user_id_raw)?;

        if duration_ms == 0 {
            self.bot
                .restrict_chat_member(chat, user, member_permissions())
                .await?;
            return Ok(());
        }

        let ms = duration_ms.max(MIN_RESTRICTION_MS) as i64;
        let until = Utc::now() + chrono::Duration::milliseconds(ms);
        self.bot
            .restrict_chat_member(chat, user, ChatPermissions::empty())
            .until_date(until)
            .await?;
        Ok(())
    }

    async fn get_member_role(
        &self,
        guild_id: &str,
        user_id_raw: &str,
    ) -> Result<MemberRole, ApiError> {
        Ok(self
            .permissions
            .member_role(chat_id(guild_id)?, user_id(user_id_raw)?)
            .await?)
    }

    async fn set_whole_group_mute(
        &self,
        family: PlatformFamily,
        guild_id: &str,
        enable: bool,
    ) -> Result<(), ApiError> {
        if family != PlatformFamily::Telegram {
            return Err(ApiError::Unsupported("whole-group mute for non-Telegram chats"));
        }

        let permissions = if enable {
            ChatPermissions::empty()
        } else {
            member_permissions()
        };
        self.bot
            .set_chat_permissions(chat_id(guild_id)?, permissions)
            .await?;
        Ok(())
    }

    async fn react_with_avatar(
        &self,
        channel_id: &str,
        user_id_raw: &str,
        image: &str,
    ) -> Result<(), ApiError> {
        let photos = self
            .bot
            .get_user_profile_photos(user_id(user_id_raw)?)
            .limit(1)
            .await?;

        let Some(avatar) = photos.photos.first().and_then(|sizes| sizes.last()) else {
            debug!("User {} has no profile photo, skipping reaction", user_id_raw);
            return Ok(());
        };

        let media = vec![
            InputMedia::Photo(InputMediaPhoto::new(InputFile::file_id(avatar.file.id.clone()))),
            InputMedia::Photo(InputMediaPhoto::new(InputFile::file_id(image))),
        ];
        self.bot.send_media_group(chat_id(channel_id)?, media).await?;
        Ok(())
    }
}
