//! CLI subcommand implementations.
//!
//! Each command opens the configured database through the same session the
//! server uses, prints a human-readable result and, for commands that write,
//! waits briefly for the memory mirror before the process exits.

pub mod catalog;
pub mod doctor;
pub mod exclusions;
pub mod reset;
pub mod suggest;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DetourConfig;
use crate::session::Session;

/// How long a short-lived command waits for in-flight mirror writes.
const MIRROR_DRAIN: Duration = Duration::from_secs(5);

fn open_session(config: &DetourConfig) -> Result<Arc<Session>> {
    crate::server::build_session(config, false)
}

async fn finish(session: &Session) {
    session.mirror().drain(MIRROR_DRAIN).await;
}
