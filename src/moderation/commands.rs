//! Moderation commands.
//!
//! Each command checks the invoker, validates its arguments and forwards to
//! the host API. Handlers return the reply text to post, if any; host
//! failures are returned as errors for the dispatcher to log.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use super::api::{ApiError, GroupIdentity, ModerationApi, PlatformFamily};
use super::scheduler::AutoUnbanScheduler;
use crate::config::PluginConfig;
use crate::i18n::get_text;
use crate::utils::{format_duration, parse_duration};

/// Authority needed for every command except `ban-me`.
pub const MODERATOR_AUTHORITY: u8 = 3;

/// Authority needed for `ban-me`.
pub const SELF_MUTE_AUTHORITY: u8 = 1;

/// A user a command acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub name: String,
}

/// Where and by whom a command was issued.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub identity: GroupIdentity,
    pub channel_id: String,
    pub invoker: Member,
    pub authority: u8,
    pub locale: String,
    /// Message the command replied to, if any.
    pub quoted_message: Option<String>,
}

pub type Reply = Option<String>;

#[derive(Clone)]
pub struct Moderator {
    api: Arc<dyn ModerationApi>,
    scheduler: AutoUnbanScheduler,
}

impl Moderator {
    pub fn new(api: Arc<dyn ModerationApi>) -> Self {
        let scheduler = AutoUnbanScheduler::new(Arc::clone(&api));
        Self { api, scheduler }
    }

    pub fn api(&self) -> &dyn ModerationApi {
        self.api.as_ref()
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &AutoUnbanScheduler {
        &self.scheduler
    }

    /// `Some(reply)` when the invoker may not run the command.
    ///
    /// Users sitting exactly at the required level must also be group
    /// admins when `checkAdmin` is on.
    async fn deny(
        &self,
        config: &PluginConfig,
        ctx: &CommandContext,
        required: u8,
    ) -> Result<Reply, ApiError> {
        let denied = if ctx.authority < required {
            true
        } else if ctx.authority == required && config.check_admin {
            let role = self
                .api
                .get_member_role(&ctx.identity.guild_id, &ctx.invoker.id)
                .await?;
            !role.is_privileged()
        } else {
            false
        };

        if denied {
            debug!(
                "Denied {} (authority {}) in {}",
                ctx.invoker.id, ctx.authority, ctx.identity
            );
            return Ok(Some(get_text(&ctx.locale, "common.no_permission")));
        }
        Ok(None)
    }

    /// `ban <user> [duration]`
    pub async fn ban(
        &self,
        config: &PluginConfig,
        ctx: &CommandContext,
        target: Option<Member>,
        duration: Option<&str>,
    ) -> Result<Reply, ApiError> {
        if let Some(reply) = self.deny(config, ctx, MODERATOR_AUTHORITY).await? {
            return Ok(Some(reply));
        }
        let Some(target) = target else {
            return Ok(Some(get_text(&ctx.locale, "common.missing_user")));
        };
        let Some(ms) = resolve_duration(duration, config.default_mute_duration) else {
            return Ok(Some(get_text(&ctx.locale, "common.missing_duration")));
        };

        self.api
            .mute_guild_member(&ctx.identity.guild_id, &target.id, ms)
            .await?;
        self.scheduler.cancel(&ctx.identity, &target.id);
        info!("{} muted {} in {} for {}ms", ctx.invoker.id, target.id, ctx.identity, ms);

        Ok(Some(
            get_text(&ctx.locale, "ban.banned")
                .replace("{user}", &target.name)
                .replace("{duration}", &format_duration(ms, &ctx.locale)),
        ))
    }

    /// `ban-me [duration]`
    pub async fn ban_me(
        &self,
        config: &PluginConfig,
        ctx: &CommandContext,
        duration: Option<&str>,
    ) -> Result<Reply, ApiError> {
        if ctx.authority < SELF_MUTE_AUTHORITY {
            return Ok(Some(get_text(&ctx.locale, "common.no_permission")));
        }
        let Some(ms) = resolve_duration(duration, config.default_mute_duration) else {
            return Ok(Some(get_text(&ctx.locale, "common.missing_duration")));
        };

        let me = &ctx.invoker;
        self.api
            .mute_guild_member(&ctx.identity.guild_id, &me.id, ms)
            .await?;
        self.scheduler.cancel(&ctx.identity, &me.id);

        let mut reply = get_text(&ctx.locale, "ban_me.done")
            .replace("{duration}", &format_duration(ms, &ctx.locale));

        let auto = &config.auto_unban;
        if auto.enable && ms > auto.max_duration {
            let delay = rand::thread_rng().gen_range(auto.min_delay..=auto.max_delay);
            self.scheduler
                .schedule(&ctx.identity, &me.id, Duration::from_millis(delay));
            info!(
                "{} self-muted in {} for {}ms, auto-unban in {}ms",
                me.id, ctx.identity, ms, delay
            );
            reply.push('\n');
            reply.push_str(&get_text(&ctx.locale, "ban_me.auto_unban"));
        }

        Ok(Some(reply))
    }

    /// `unban <user>`
    pub async fn unban(
        &self,
        config: &PluginConfig,
        ctx: &CommandContext,
        target: Option<Member>,
    ) -> Result<Reply, ApiError> {
        if let Some(reply) = self.deny(config, ctx, MODERATOR_AUTHORITY).await? {
            return Ok(Some(reply));
        }
        let Some(target) = target else {
            return Ok(Some(get_text(&ctx.locale, "common.missing_user")));
        };

        self.api
            .mute_guild_member(&ctx.identity.guild_id, &target.id, 0)
            .await?;
        self.scheduler.cancel(&ctx.identity, &target.id);
        info!("{} unmuted {} in {}", ctx.invoker.id, target.id, ctx.identity);

        Ok(Some(
            get_text(&ctx.locale, "unban.done").replace("{user}", &target.name),
        ))
    }

    /// `delete-message`, replying to the message to remove.
    pub async fn delete_message(
        &self,
        config: &PluginConfig,
        ctx: &CommandContext,
    ) -> Result<Reply, ApiError> {
        if let Some(reply) = self.deny(config, ctx, MODERATOR_AUTHORITY).await? {
            return Ok(Some(reply));
        }
        let Some(quoted) = ctx.quoted_message.as_deref() else {
            return Ok(Some(get_text(&ctx.locale, "delete.missing_quote")));
        };

        self.api.delete_message(&ctx.channel_id, quoted).await?;
        Ok(None)
    }

    /// `mute-all` / `unmute-all`
    ///
    /// The platform is checked before anything else so an unsupported
    /// platform never reaches the host API.
    pub async fn set_mute_all(
        &self,
        config: &PluginConfig,
        ctx: &CommandContext,
        enable: bool,
    ) -> Result<Reply, ApiError> {
        let Some(family) = PlatformFamily::of(&ctx.identity.platform) else {
            return Ok(Some(get_text(&ctx.locale, "common.unsupported_platform")));
        };
        if let Some(reply) = self.deny(config, ctx, MODERATOR_AUTHORITY).await? {
            return Ok(Some(reply));
        }

        self.api
            .set_whole_group_mute(family, &ctx.identity.guild_id, enable)
            .await?;
        info!(
            "{} set whole-group mute {} in {}",
            ctx.invoker.id, enable, ctx.identity
        );

        let key = if enable {
            "mute_all.enabled"
        } else {
            "mute_all.disabled"
        };
        Ok(Some(get_text(&ctx.locale, key)))
    }
}

/// Textual durations must parse to something; a missing one takes `default`.
/// Zero is never a usable mute length.
fn resolve_duration(arg: Option<&str>, default: u64) -> Option<u64> {
    let ms = match arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => parse_duration(text),
        None => default,
    };
    (ms > 0).then_some(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::api::MemberRole;
    use crate::moderation::testing::{Call, RecordingApi};

    fn ctx(platform: &str, authority: u8) -> CommandContext {
        CommandContext {
            identity: GroupIdentity::new(platform, "-100"),
            channel_id: "-100".into(),
            invoker: Member { id: "1".into(), name: "Mod".into() },
            authority,
            locale: "en".into(),
            quoted_message: None,
        }
    }

    fn bob() -> Option<Member> {
        Some(Member { id: "2".into(), name: "Bob".into() })
    }

    fn setup(api: RecordingApi) -> (Arc<RecordingApi>, Moderator) {
        crate::i18n::init();
        let api = Arc::new(api);
        let moderator = Moderator::new(api.clone());
        (api, moderator)
    }

    #[test]
    fn duration_argument_rules() {
        assert_eq!(resolve_duration(None, 600_000), Some(600_000));
        assert_eq!(resolve_duration(Some("  "), 600_000), Some(600_000));
        assert_eq!(resolve_duration(Some("2h"), 600_000), Some(7_200_000));
        assert_eq!(resolve_duration(Some("soon"), 600_000), None);
        assert_eq!(resolve_duration(None, 0), None);
    }

    #[tokio::test]
    async fn ban_mutes_target() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig { check_admin: false, ..Default::default() };

        let reply = moderator
            .ban(&config, &ctx("telegram", 3), bob(), Some("1h"))
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("Bob has been muted for 1h."));
        assert_eq!(
            api.calls(),
            vec![Call::Mute { guild: "-100".into(), user: "2".into(), duration_ms: 3_600_000 }]
        );
    }

    #[tokio::test]
    async fn low_authority_is_refused_without_calls() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();

        let reply = moderator
            .ban(&config, &ctx("telegram", 2), bob(), None)
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("Insufficient permission."));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn exact_authority_needs_admin_role() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();

        let reply = moderator
            .unban(&config, &ctx("telegram", 3), bob())
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("Insufficient permission."));
        assert_eq!(
            api.calls(),
            vec![Call::Role { guild: "-100".into(), user: "1".into() }]
        );
    }

    #[tokio::test]
    async fn exact_authority_admin_passes() {
        let (api, moderator) = setup(RecordingApi::default().with_role("1", MemberRole::Admin));
        let config = PluginConfig::default();

        let reply = moderator
            .unban(&config, &ctx("telegram", 3), bob())
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("Bob has been unmuted."));
        assert!(api.calls().contains(&Call::Mute {
            guild: "-100".into(),
            user: "2".into(),
            duration_ms: 0
        }));
    }

    #[tokio::test]
    async fn higher_authority_skips_role_lookup() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();

        moderator
            .unban(&config, &ctx("telegram", 4), bob())
            .await
            .unwrap();

        assert!(!api.calls().iter().any(|c| matches!(c, Call::Role { .. })));
    }

    #[tokio::test]
    async fn missing_user_and_duration() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();

        let reply = moderator
            .ban(&config, &ctx("telegram", 4), None, Some("1h"))
            .await
            .unwrap();
        assert_eq!(reply, Some(get_text("en", "common.missing_user")));

        let reply = moderator
            .ban(&config, &ctx("telegram", 4), bob(), Some("whenever"))
            .await
            .unwrap();
        assert_eq!(reply, Some(get_text("en", "common.missing_duration")));

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_message_needs_quote() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();
        let mut c = ctx("telegram", 4);

        let reply = moderator.delete_message(&config, &c).await.unwrap();
        assert_eq!(reply, Some(get_text("en", "delete.missing_quote")));

        c.quoted_message = Some("55".into());
        let reply = moderator.delete_message(&config, &c).await.unwrap();
        assert_eq!(reply, None);
        assert_eq!(
            api.calls(),
            vec![Call::Delete { channel: "-100".into(), message: "55".into() }]
        );
    }

    #[tokio::test]
    async fn mute_all_on_unknown_platform_makes_no_calls() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();

        for enable in [true, false] {
            for authority in [0, 3, 5] {
                let reply = moderator
                    .set_mute_all(&config, &ctx("discord", authority), enable)
                    .await
                    .unwrap();
                assert_eq!(reply, Some(get_text("en", "common.unsupported_platform")));
            }
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn mute_all_uses_platform_family() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();

        let reply = moderator
            .set_mute_all(&config, &ctx("qq", 4), true)
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("Whole-group mute is on."));
        assert_eq!(
            api.calls(),
            vec![Call::WholeMute {
                family: PlatformFamily::OneBot,
                guild: "-100".into(),
                enable: true
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ban_me_long_mute_schedules_auto_unban() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();
        let c = ctx("telegram", 1);

        let reply = moderator.ban_me(&config, &c, Some("2天")).await.unwrap().unwrap();
        assert!(reply.contains(&get_text("en", "ban_me.auto_unban")));
        assert!(moderator.scheduler().is_pending(&c.identity, "1"));

        // default bounds: 1 to 5 minutes
        tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;
        assert_eq!(
            api.calls(),
            vec![
                Call::Mute { guild: "-100".into(), user: "1".into(), duration_ms: 2 * 86_400_000 },
                Call::Mute { guild: "-100".into(), user: "1".into(), duration_ms: 0 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ban_me_short_mute_schedules_nothing() {
        let (_api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();
        let c = ctx("telegram", 1);

        let reply = moderator.ban_me(&config, &c, Some("30分")).await.unwrap().unwrap();
        assert_eq!(reply, "Granted. You are muted for 30m.");
        assert!(!moderator.scheduler().is_pending(&c.identity, "1"));
    }

    #[tokio::test(start_paused = true)]
    async fn unban_cancels_pending_auto_unban() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();
        let me = ctx("telegram", 1);

        moderator.ban_me(&config, &me, Some("1d")).await.unwrap();
        assert!(moderator.scheduler().is_pending(&me.identity, "1"));

        let target = Some(Member { id: "1".into(), name: "Mod".into() });
        moderator
            .unban(&config, &ctx("telegram", 4), target)
            .await
            .unwrap();
        assert!(!moderator.scheduler().is_pending(&me.identity, "1"));

        tokio::time::sleep(Duration::from_secs(600)).await;
        let unmutes = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Mute { duration_ms: 0, .. }))
            .count();
        assert_eq!(unmutes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ban_cancels_pending_auto_unban() {
        let (api, moderator) = setup(RecordingApi::default());
        let config = PluginConfig::default();
        let me = ctx("telegram", 1);

        moderator.ban_me(&config, &me, Some("1d")).await.unwrap();
        assert!(moderator.scheduler().is_pending(&me.identity, "1"));

        let target = Some(Member { id: "1".into(), name: "Mod".into() });
        moderator
            .ban(&config, &ctx("telegram", 4), target, Some("3d"))
            .await
            .unwrap();
        assert!(!moderator.scheduler().is_pending(&me.identity, "1"));

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(
            !api.calls()
                .iter()
                .any(|c| matches!(c, Call::Mute { duration_ms: 0, .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ban_keeps_pending_auto_unban() {
        let (api, moderator) = setup(RecordingApi::failing_mute());
        let config = PluginConfig::default();
        let c = ctx("telegram", 4);
        moderator
            .scheduler()
            .schedule(&c.identity, "2", Duration::from_secs(60));

        let result = moderator.ban(&config, &c, bob(), Some("1h")).await;
        assert!(result.is_err());
        assert!(moderator.scheduler().is_pending(&c.identity, "2"));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(
            api.calls().last(),
            Some(&Call::Mute { guild: "-100".into(), user: "2".into(), duration_ms: 0 })
        );
    }
}
