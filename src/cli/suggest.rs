//! CLI `suggest` and `say` commands.

use anyhow::Result;

use super::{finish, open_session};
use crate::config::DetourConfig;
use crate::session::{SuggestParams, SuggestionBlock};

pub async fn suggest(
    config: &DetourConfig,
    anchor: Option<String>,
    free_time_min: u32,
    message: Option<String>,
    json: bool,
) -> Result<()> {
    let session = open_session(config)?;
    let params = SuggestParams {
        anchor_id: anchor.unwrap_or_else(|| session.context().default_anchor.clone()),
        free_time_min,
        message,
    };
    let outcome = session.suggest(params.clone())?;
    let block = SuggestionBlock { params, outcome };

    if json {
        println!("{}", serde_json::to_string_pretty(&block)?);
    } else {
        println!("{}", block.render());
    }
    finish(&session).await;
    Ok(())
}

/// Send one message through the classifier, as the chat surface would.
pub async fn say(config: &DetourConfig, message: &str, json: bool) -> Result<()> {
    let session = open_session(config)?;
    let reply = session.handle_message(message).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.render());
    }
    finish(&session).await;
    Ok(())
}
