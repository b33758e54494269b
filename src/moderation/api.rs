//! Host bot surface the moderation logic talks to.

use std::fmt;

use async_trait::async_trait;

/// A chat group across platforms: `platform:guildId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupIdentity {
    pub platform: String,
    pub guild_id: String,
}

impl GroupIdentity {
    pub fn new(platform: impl Into<String>, guild_id: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            guild_id: guild_id.into(),
        }
    }

    /// Key used by the rules table.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GroupIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.guild_id)
    }
}

/// Role a platform reports for a member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

/// Platforms grouped by the whole-group mute API they share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    OneBot,
    Kook,
    Telegram,
}

impl PlatformFamily {
    pub fn of(platform: &str) -> Option<Self> {
        match platform {
            "onebot" | "qq" => Some(Self::OneBot),
            "kook" => Some(Self::Kook),
            "telegram" => Some(Self::Telegram),
            _ => None,
        }
    }
}

/// A group message as seen by the blocklist matcher.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub identity: GroupIdentity,
    pub channel_id: String,
    pub message_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    /// Platform references to embedded images, in message order.
    pub images: Vec<String>,
}

/// Failure of a host API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("{0} is not supported by this adapter")]
    Unsupported(&'static str),
}

/// Operations the host bot provides. Every call may fail.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ApiError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ApiError>;

    /// Mute a member for `duration_ms`; 0 lifts the mute.
    async fn mute_guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
        duration_ms: u64,
    ) -> Result<(), ApiError>;

    async fn get_member_role(&self, guild_id: &str, user_id: &str) -> Result<MemberRole, ApiError>;

    async fn set_whole_group_mute(
        &self,
        family: PlatformFamily,
        guild_id: &str,
        enable: bool,
    ) -> Result<(), ApiError>;

    /// Post the sender's avatar together with `image`. Used when a blocked
    /// message could not be recalled.
    async fn react_with_avatar(
        &self,
        channel_id: &str,
        user_id: &str,
        image: &str,
    ) -> Result<(), ApiError>;
}
