pub mod add_source;
pub mod category;
pub mod list_sources;
pub mod remove_source;
pub mod reset_session;
pub mod send_message;
pub mod suggest_places;
pub mod verify_exclusions;

use add_source::AddSourceParams;
use category::CategoryParams;
use list_sources::ListSourcesParams;
use remove_source::RemoveSourceParams;
use reset_session::ResetSessionParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use send_message::SendMessageParams;
use serde::Serialize;
use std::sync::Arc;
use suggest_places::SuggestPlacesParams;
use verify_exclusions::ExclusionQueryParams;

use crate::catalog::types::NewSource;
use crate::session::{Routed, Session, SuggestParams, SuggestionBlock};

/// The Detour MCP tool handler. Holds the shared session and exposes every
/// operation via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct DetourTools {
    tool_router: ToolRouter<Self>,
    session: Arc<Session>,
}

/// Run a synchronous session call off the async executor.
async fn blocking<T, F>(session: &Arc<Session>, what: &str, f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&Session) -> anyhow::Result<T> + Send + 'static,
{
    let session = Arc::clone(session);
    tokio::task::spawn_blocking(move || f(&session))
        .await
        .map_err(|e| format!("{what} task failed: {e}"))?
        .map_err(|e| format!("{what} failed: {e}"))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl DetourTools {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            session,
        }
    }

    /// Rank up to three places for the given free time and anchor.
    #[tool(description = "Suggest up to 3 places that fit the free time. Forgotten categories are never returned. Each result carries a reason.")]
    async fn suggest_places(
        &self,
        Parameters(params): Parameters<SuggestPlacesParams>,
    ) -> Result<String, String> {
        if params.free_time_min < 0 {
            return Err(format!(
                "free_time_min must be >= 0, got {}",
                params.free_time_min
            ));
        }
        let free_time_min = u32::try_from(params.free_time_min)
            .map_err(|_| format!("free_time_min is too large: {}", params.free_time_min))?;

        let anchor_id = match params.anchor_id {
            Some(a) if a.trim().is_empty() => return Err("anchor_id must not be empty".into()),
            Some(a) => a,
            None => self.session.context().default_anchor.clone(),
        };

        tracing::info!(anchor_id = %anchor_id, free_time_min, "suggest_places called");

        let suggest = SuggestParams {
            anchor_id,
            free_time_min,
            message: params.message,
        };
        let block = blocking(&self.session, "suggest", move |s| {
            let outcome = s.suggest(suggest.clone())?;
            Ok(SuggestionBlock {
                params: suggest,
                outcome,
            })
        })
        .await?;

        to_json(&block)
    }

    /// Route a free-text message: gap fill, forget, suggest, or chat.
    #[tool(description = "Send a traveler's message. It may trigger suggestions, forget a category (and re-suggest), or fall through to chat. Returns the structured reply and its text.")]
    async fn send_message(
        &self,
        Parameters(params): Parameters<SendMessageParams>,
    ) -> Result<String, String> {
        if params.text.trim().is_empty() {
            return Err("text must not be empty".into());
        }
        tracing::info!(text_len = params.text.len(), "send_message called");

        let text = params.text.clone();
        let reply = match blocking(&self.session, "message", move |s| s.route_message(&text)).await? {
            Routed::Done(reply) => reply,
            Routed::Chat(snapshot) => self
                .session
                .chat_message(&params.text, snapshot)
                .await
                .map_err(|e| format!("message failed: {e}"))?,
        };

        Ok(serde_json::json!({
            "reply": reply,
            "text": reply.render(),
        })
        .to_string())
    }

    /// Exclude a whole category from all future suggestions.
    #[tool(description = "Forget a whole category (e.g. 'cafe'). Its sources stay in the catalog but are never suggested until restored. Set resuggest=true to re-run the last suggestion.")]
    async fn forget_category(
        &self,
        Parameters(params): Parameters<CategoryParams>,
    ) -> Result<String, String> {
        tracing::info!(category = %params.category, "forget_category called");
        let resuggest = params.resuggest.unwrap_or(false);
        let category = params.category;

        let (forget, block) = blocking(&self.session, "forget", move |s| {
            let forget = s.forget_category(&category)?;
            let block = if resuggest {
                let last = s.last_request();
                Some(s.resuggest(last.as_ref())?)
            } else {
                None
            };
            Ok((forget, block))
        })
        .await?;

        Ok(serde_json::json!({
            "forget": forget,
            "resuggest": block,
        })
        .to_string())
    }

    /// Lift an exclusion.
    #[tool(description = "Restore a previously forgotten category so its places can be suggested again.")]
    async fn restore_category(
        &self,
        Parameters(params): Parameters<CategoryParams>,
    ) -> Result<String, String> {
        tracing::info!(category = %params.category, "restore_category called");
        let category = params.category;
        let outcome = blocking(&self.session, "restore", move |s| {
            s.restore_category(&category)
        })
        .await?;
        to_json(&outcome)
    }

    /// Current exclusions in the order they were added.
    #[tool(description = "List forgotten categories in the order they were forgotten, optionally with recent ledger history.")]
    async fn list_exclusions(
        &self,
        Parameters(params): Parameters<ExclusionQueryParams>,
    ) -> Result<String, String> {
        let history = params.history.unwrap_or(0);
        let (excluded, log) = blocking(&self.session, "list exclusions", move |s| {
            let excluded = s.exclusions()?;
            let log = if history > 0 {
                s.exclusion_history(history)?
            } else {
                Vec::new()
            };
            Ok((excluded, log))
        })
        .await?;

        Ok(serde_json::json!({
            "excluded_categories": excluded,
            "history": log,
        })
        .to_string())
    }

    /// Compare the memory service's view of exclusions with the local ledger.
    #[tool(description = "Check whether the long-term memory service agrees with the local exclusion list. Diagnostic only; nothing is changed.")]
    async fn verify_exclusions(
        &self,
        Parameters(_params): Parameters<ExclusionQueryParams>,
    ) -> Result<String, String> {
        tracing::info!("verify_exclusions called");
        let report = self
            .session
            .verify()
            .await
            .map_err(|e| format!("verify failed: {e}"))?;
        to_json(&report)
    }

    /// Register a new candidate place or activity.
    #[tool(description = "Add a place or activity to the catalog.")]
    async fn add_source(
        &self,
        Parameters(params): Parameters<AddSourceParams>,
    ) -> Result<String, String> {
        if let Some(p) = params.priority {
            if !(1..=5).contains(&p) {
                return Err("priority must be between 1 and 5".into());
            }
        }
        let new = NewSource {
            id: params.id,
            name: params.name,
            category: params.category,
            memo: params.memo.unwrap_or_default(),
            duration_min: params.duration_min,
            anchor_id: params.anchor_id,
            priority: params.priority,
            tags: params.tags,
            kind: None,
        };
        let source = blocking(&self.session, "add source", move |s| s.add_source(&new)).await?;
        to_json(&source)
    }

    /// Delete a source from the catalog.
    #[tool(description = "Delete a source from the catalog by id.")]
    async fn remove_source(
        &self,
        Parameters(params): Parameters<RemoveSourceParams>,
    ) -> Result<String, String> {
        let id = params.id;
        let removed = blocking(&self.session, "remove source", move |s| s.remove_source(&id))
            .await?;
        Ok(serde_json::json!({
            "removed": removed.is_some(),
            "source": removed,
        })
        .to_string())
    }

    /// List catalog sources.
    #[tool(description = "List catalog sources, optionally filtered by category or with forgotten categories hidden.")]
    async fn list_sources(
        &self,
        Parameters(params): Parameters<ListSourcesParams>,
    ) -> Result<String, String> {
        let hide_excluded = params.hide_excluded.unwrap_or(false);
        let category = params.category;
        let sources = blocking(&self.session, "list sources", move |s| {
            let mut sources = s.list_sources(category.as_deref())?;
            if hide_excluded {
                let excluded = s.exclusions()?;
                sources.retain(|src| !excluded.contains(&src.category));
            }
            Ok(sources)
        })
        .await?;

        Ok(serde_json::json!({
            "sources": sources,
            "total": sources.len(),
        })
        .to_string())
    }

    /// Clear the session.
    #[tool(description = "Clear all exclusions, the last suggestion and the conversation. Requires confirm=true. include_catalog=true also deletes every source.")]
    async fn reset_session(
        &self,
        Parameters(params): Parameters<ResetSessionParams>,
    ) -> Result<String, String> {
        if !params.confirm {
            return Err("reset requires confirm=true".into());
        }
        let include_catalog = params.include_catalog.unwrap_or(false);
        let outcome = blocking(&self.session, "reset", move |s| s.reset(include_catalog)).await?;
        to_json(&outcome)
    }
}

#[tool_handler]
impl ServerHandler for DetourTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Detour suggests places for unplanned free time during a trip. Use suggest_places \
                 or send_message to get suggestions, and forget_category when the traveler has \
                 had enough of a category; forgotten categories are never suggested again."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
