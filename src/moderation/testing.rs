//! Recording fake of the host API.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::api::{ApiError, MemberRole, ModerationApi, PlatformFamily};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { channel: String, text: String },
    Delete { channel: String, message: String },
    Mute { guild: String, user: String, duration_ms: u64 },
    Role { guild: String, user: String },
    WholeMute { family: PlatformFamily, guild: String, enable: bool },
    React { channel: String, user: String, image: String },
}

#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    pub fail_delete: bool,
    pub fail_mute: bool,
    pub roles: HashMap<String, MemberRole>,
}

impl RecordingApi {
    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Default::default()
        }
    }

    pub fn failing_mute() -> Self {
        Self {
            fail_mute: true,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, user: &str, role: MemberRole) -> Self {
        self.roles.insert(user.to_string(), role);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ModerationApi for RecordingApi {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ApiError> {
        self.record(Call::Send {
            channel: channel_id.into(),
            text: text.into(),
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ApiError> {
        self.record(Call::Delete {
            channel: channel_id.into(),
            message: message_id.into(),
        });
        if self.fail_delete {
            return Err(ApiError::Request("message can't be deleted".into()));
        }
        Ok(())
    }

    async fn mute_guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
        duration_ms: u64,
    ) -> Result<(), ApiError> {
        self.record(Call::Mute {
            guild: guild_id.into(),
            user: user_id.into(),
            duration_ms,
        });
        if self.fail_mute {
            return Err(ApiError::Request("not enough rights".into()));
        }
        Ok(())
    }

    async fn get_member_role(&self, guild_id: &str, user_id: &str) -> Result<MemberRole, ApiError> {
        self.record(Call::Role {
            guild: guild_id.into(),
            user: user_id.into(),
        });
        Ok(self.roles.get(user_id).copied().unwrap_or(MemberRole::Member))
    }

    async fn set_whole_group_mute(
        &self,
        family: PlatformFamily,
        guild_id: &str,
        enable: bool,
    ) -> Result<(), ApiError> {
        self.record(Call::WholeMute {
            family,
            guild: guild_id.into(),
            enable,
        });
        Ok(())
    }

    async fn react_with_avatar(
        &self,
        channel_id: &str,
        user_id: &str,
        image: &str,
    ) -> Result<(), ApiError> {
        self.record(Call::React {
            channel: channel_id.into(),
            user: user_id.into(),
            image: image.into(),
        });
        Ok(())
    }
}
