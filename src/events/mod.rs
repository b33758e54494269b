//! Event handlers that run before commands.

pub mod blocklist;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::trace;

pub use blocklist::passes_blocklist;

/// Catch-all for updates no other handler took.
pub fn unhandled_handler() -> UpdateHandler<anyhow::Error> {
    dptree::endpoint(ignore_update)
}

async fn ignore_update(update: Update) -> anyhow::Result<()> {
    trace!("Ignoring update {}", update.id.0);
    Ok(())
}
