//! Permission system for the Telegram adapter.
//!
//! Two independent notions meet here:
//!
//! - authority: a numeric level from the rules file (owners get 4)
//! - member role: owner/admin/member as reported by Telegram, cached

mod checker;

pub use checker::Permissions;
