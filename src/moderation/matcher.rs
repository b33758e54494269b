//! Blocklist middleware.
//!
//! Looks up the rule for a message's group, tests the text against the
//! rule's patterns and, on the first hit, runs the configured reactions.
//! A blocked message must not reach any later handler.

use regex::Regex;
use tracing::{debug, info, warn};

use super::api::{ApiError, IncomingMessage, ModerationApi};
use crate::cache::{CacheConfig, TypedCache};
use crate::config::{BlockingRule, PluginConfig};
use crate::i18n::get_text;
use crate::utils::format_duration;

/// Outcome of screening one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the message to the next handler.
    Pass,
    /// Stop processing; `pattern` is the rule entry that matched.
    Blocked { pattern: String },
}

impl Verdict {
    #[cfg(test)]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Stateless apart from a cache of compiled patterns keyed by source.
#[derive(Clone, Debug)]
pub struct RuleMatcher {
    // None = source failed to compile
    patterns: TypedCache<String, Option<Regex>>,
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleMatcher {
    pub fn new() -> Self {
        Self {
            patterns: TypedCache::new(
                "blocking_patterns",
                CacheConfig::with_capacity(4_096).no_expiry(),
            ),
        }
    }

    fn compiled(&self, source: &str) -> Option<Regex> {
        let key = source.to_string();
        if let Some(cached) = self.patterns.get(&key) {
            return cached;
        }

        let compiled = match Regex::new(source) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring invalid blocking pattern {:?}: {}", source, e);
                None
            }
        };
        self.patterns.insert(key, compiled.clone());
        compiled
    }

    /// First pattern of `rule` found anywhere in `content`.
    pub fn first_match<'r>(&self, rule: &'r BlockingRule, content: &str) -> Option<&'r str> {
        rule.blocking_words
            .iter()
            .find(|source| {
                self.compiled(source)
                    .is_some_and(|re| re.is_match(content))
            })
            .map(String::as_str)
    }

    /// Screen a message and react to a hit.
    ///
    /// A failed recall is not an error: if the message carried an image the
    /// sender's avatar is posted with it instead. Send and mute failures are
    /// returned after the message has already been judged blocked, so callers
    /// must still stop processing on `Err`.
    pub async fn screen(
        &self,
        config: &PluginConfig,
        api: &dyn ModerationApi,
        msg: &IncomingMessage,
        locale: &str,
    ) -> Result<Verdict, ApiError> {
        let Some(rule) = config.rule(&msg.identity.key()) else {
            return Ok(Verdict::Pass);
        };
        if !rule.enable {
            return Ok(Verdict::Pass);
        }

        let Some(pattern) = self.first_match(rule, &msg.content) else {
            debug!("No blocking word in message {} of {}", msg.message_id, msg.identity);
            return Ok(Verdict::Pass);
        };

        info!(
            "Blocking word {:?} hit by {} in {}",
            pattern, msg.sender_id, msg.identity
        );

        if rule.tip {
            let text = get_text(locale, "blockwords.hit").replace("{user}", &msg.sender_name);
            api.send(&msg.channel_id, &text).await?;
        }

        if rule.recall {
            match api.delete_message(&msg.channel_id, &msg.message_id).await {
                Ok(()) => {
                    if rule.tip {
                        api.send(&msg.channel_id, &get_text(locale, "blockwords.recalled"))
                            .await?;
                    }
                }
                Err(e) => {
                    debug!("Recall of {} failed: {}", msg.message_id, e);
                    if let Some(image) = msg.images.first() {
                        if let Err(e) = api
                            .react_with_avatar(&msg.channel_id, &msg.sender_id, image)
                            .await
                        {
                            warn!("Avatar reaction in {} failed: {}", msg.identity, e);
                        }
                    }
                }
            }
        }

        if rule.mute {
            api.mute_guild_member(&msg.identity.guild_id, &msg.sender_id, rule.mute_duration)
                .await?;
            if rule.tip {
                let text = get_text(locale, "blockwords.muted")
                    .replace("{user}", &msg.sender_name)
                    .replace("{duration}", &format_duration(rule.mute_duration, locale));
                api.send(&msg.channel_id, &text).await?;
            }
        }

        Ok(Verdict::Blocked {
            pattern: pattern.to_string(),
        })
    }
}
