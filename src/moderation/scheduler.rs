//! Delayed self-unmute timers for `ban-me`.
//!
//! One timer per (group, user). Scheduling again replaces the old timer, and
//! an explicit unban or re-mute cancels it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::api::{GroupIdentity, ModerationApi};

type TimerKey = (GroupIdentity, String);

struct PendingUnban {
    id: u64,
    handle: AbortHandle,
}

#[derive(Clone)]
pub struct AutoUnbanScheduler {
    api: Arc<dyn ModerationApi>,
    pending: Arc<DashMap<TimerKey, PendingUnban>>,
    next_id: Arc<AtomicU64>,
}

impl AutoUnbanScheduler {
    pub fn new(api: Arc<dyn ModerationApi>) -> Self {
        Self {
            api,
            pending: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Unmute `user_id` in `identity` after `delay`, replacing any timer
    /// already pending for the pair.
    pub fn schedule(&self, identity: &GroupIdentity, user_id: &str, delay: Duration) {
        let key: TimerKey = (identity.clone(), user_id.to_string());
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (armed_tx, armed_rx) = oneshot::channel::<()>();

        let api = Arc::clone(&self.api);
        let pending = Arc::clone(&self.pending);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            // wait until our entry is in the map
            if armed_rx.await.is_err() {
                return;
            }
            tokio::time::sleep(delay).await;

            pending.remove_if(&task_key, |_, p| p.id == id);

            let (identity, user_id) = task_key;
            match api.mute_guild_member(&identity.guild_id, &user_id, 0).await {
                Ok(()) => info!("Auto-unbanned {} in {}", user_id, identity),
                Err(e) => warn!("Auto-unban of {} in {} failed: {}", user_id, identity, e),
            }
        });

        let entry = PendingUnban {
            id,
            handle: task.abort_handle(),
        };
        if let Some(previous) = self.pending.insert(key, entry) {
            previous.handle.abort();
            debug!("Replaced pending auto-unban for {} in {}", user_id, identity);
        }
        let _ = armed_tx.send(());
    }

    /// Cancel the timer for the pair. Returns whether one was pending.
    pub fn cancel(&self, identity: &GroupIdentity, user_id: &str) -> bool {
        match self.pending.remove(&(identity.clone(), user_id.to_string())) {
            Some((_, p)) => {
                p.handle.abort();
                debug!("Cancelled auto-unban for {} in {}", user_id, identity);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self, identity: &GroupIdentity, user_id: &str) -> bool {
        self.pending
            .contains_key(&(identity.clone(), user_id.to_string()))
    }
}
