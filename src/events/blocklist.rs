//! Blocklist filter for incoming group messages.

use teloxide::prelude::*;
use tracing::{debug, error};

use crate::bot::dispatcher::AppState;
use crate::bot::telegram::incoming_message;
use crate::moderation::matcher::Verdict;
use crate::moderation::{ApiError, IncomingMessage};

/// `true` lets the message continue to the command handlers.
pub async fn passes_blocklist(msg: Message, state: AppState) -> bool {
    let Some(incoming) = incoming_message(&msg) else {
        return true;
    };

    let config = state.config.snapshot();
    let locale = state.locale(&config, &msg);

    let outcome = state
        .matcher
        .screen(&config, state.moderator.api(), &incoming, &locale)
        .await;
    lets_through(outcome, &incoming)
}

/// A blocked message stops here even when one of its reactions failed; the
/// failure is logged.
fn lets_through(outcome: Result<Verdict, ApiError>, incoming: &IncomingMessage) -> bool {
    match outcome {
        Ok(Verdict::Pass) => true,
        Ok(Verdict::Blocked { .. }) => {
            debug!(
                "Message {} in {} stopped by blocklist",
                incoming.message_id, incoming.identity
            );
            false
        }
        Err(e) => {
            error!("Blocklist reaction in {} failed: {}", incoming.identity, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockingRule, PluginConfig};
    use crate::moderation::testing::RecordingApi;
    use crate::moderation::{GroupIdentity, RuleMatcher};

    fn message(content: &str) -> IncomingMessage {
        IncomingMessage {
            identity: GroupIdentity::new("telegram", "-100"),
            channel_id: "-100".into(),
            message_id: "7".into(),
            sender_id: "42".into(),
            sender_name: "Alice".into(),
            content: content.into(),
            images: Vec::new(),
        }
    }

    fn muting_config() -> PluginConfig {
        let mut config = PluginConfig::default();
        config.rules.insert(
            "telegram:-100".into(),
            BlockingRule {
                blocking_words: vec!["spam".into()],
                mute: true,
                recall: false,
                tip: false,
                ..Default::default()
            },
        );
        config
    }

    #[tokio::test]
    async fn failed_reaction_still_blocks() {
        let api = RecordingApi::failing_mute();
        let msg = message("buy spam now");

        let outcome = RuleMatcher::new()
            .screen(&muting_config(), &api, &msg, "en")
            .await;
        assert!(outcome.is_err());
        assert!(!lets_through(outcome, &msg));
    }

    #[tokio::test]
    async fn clean_message_passes() {
        let api = RecordingApi::default();
        let msg = message("hello");

        let outcome = RuleMatcher::new()
            .screen(&muting_config(), &api, &msg, "en")
            .await;
        assert!(lets_through(outcome, &msg));
    }

    #[test]
    fn blocked_verdict_stops_message() {
        let msg = message("spam");
        let verdict = Verdict::Blocked { pattern: "spam".into() };
        assert!(!lets_through(Ok(verdict), &msg));
    }
}
