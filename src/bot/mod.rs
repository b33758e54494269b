//! Bot module - Telegram glue around the moderation core.

pub mod dispatcher;
mod runtime;
pub mod telegram;
mod webhook;

pub use dispatcher::build_dispatcher;
pub use runtime::{reload_on_hangup, run};
