//! Platform-independent moderation logic.
//!
//! - `api` - host bot surface ([`ModerationApi`]) and shared types
//! - `matcher` - blocklist middleware
//! - `commands` - ban / ban-me / unban / delete-message / mute-all
//! - `scheduler` - cancellable auto-unban timers
//!
//! Nothing here knows about Telegram; the adapter lives in `bot::telegram`.

pub mod api;
pub mod commands;
pub mod matcher;
pub mod scheduler;

#[cfg(test)]
pub mod testing;

pub use api::{
    ApiError, GroupIdentity, IncomingMessage, MemberRole, ModerationApi, PlatformFamily,
};
pub use commands::{CommandContext, Member, Moderator};
pub use matcher::RuleMatcher;
