//! Member role lookups with caching, plus authority resolution.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberKind, UserId};
use teloxide::RequestError;
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::config::rules::OWNER_AUTHORITY;
use crate::config::PluginConfig;
use crate::moderation::MemberRole;

/// Cache key for role lookups.
type RoleCacheKey = (i64, u64); // (chat_id, user_id)

/// Role checker backed by `getChatMember`.
///
/// Bot owners (from OWNER_IDS env) count as group owners everywhere and hold
/// at least owner authority.
#[derive(Clone)]
pub struct Permissions {
    bot: Bot,
    cache: TypedCache<RoleCacheKey, MemberRole>,
    owner_ids: Vec<u64>,
}

impl Permissions {
    pub fn with_owners(bot: Bot, owner_ids: Vec<u64>) -> Self {
        let cache = TypedCache::new(
            "member_roles",
            CacheConfig::with_capacity(10_000)
                .ttl(Duration::from_secs(300)) // 5 minutes
                .tti(Duration::from_secs(120)), // 2 minutes idle
        );

        Self {
            bot,
            cache,
            owner_ids,
        }
    }

    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Authority level used by the command checks.
    pub fn authority(&self, config: &PluginConfig, user_id: UserId) -> u8 {
        let configured = config.authority("telegram", &user_id.to_string());
        if self.is_bot_owner(user_id) {
            configured.max(OWNER_AUTHORITY)
        } else {
            configured
        }
    }

    /// Role of a user in a chat, cached for a few minutes.
    pub async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberRole, RequestError> {
        if self.is_bot_owner(user_id) {
            return Ok(MemberRole::Owner);
        }

        let cache_key = (chat_id.0, user_id.0);
        if let Some(role) = self.cache.get(&cache_key) {
            debug!("Role cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(role);
        }

        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let role = match member.kind {
            ChatMemberKind::Owner(_) => MemberRole::Owner,
            ChatMemberKind::Administrator(_) => MemberRole::Admin,
            _ => MemberRole::Member,
        };

        self.cache.insert(cache_key, role);
        Ok(role)
    }
}
