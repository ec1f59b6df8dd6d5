//! Session orchestration.
//!
//! A [`Session`] ties the catalog, the exclusion ledger, the engine, the
//! classifier and the remote collaborators together for one traveler. It owns
//! the one-slot cache of the most recent suggestion parameters and the chat
//! transcript; both are cleared by [`Session::reset`].
//!
//! Locking: the database mutex is held only for local reads and writes. Mirror
//! dispatch, verification and chat calls all happen after it is released.

pub mod reply;

use anyhow::{anyhow, bail, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::catalog::import::{self, ImportSummary, TripImport};
use crate::catalog::store;
use crate::catalog::types::{category_label, NewSource, Source};
use crate::exclusion::ledger;
use crate::exclusion::mirror::{ExclusionMirror, VerifyReport};
use crate::intent::{Intent, IntentClassifier};
use crate::recommend::{Recommender, SuggestOutcome};
use crate::remote::chat::{ChatRequest, ChatService, ChatTurn};
use crate::remote::memory::{MemoryRecord, MemoryService};

pub use reply::{Reply, SuggestionBlock};

const PREFERENCES_QUERY: &str =
    "What are the user's travel preferences, food preferences, budget and past trips?";
const CHAT_UNAVAILABLE: &str = "Sorry, I can't chat right now. Try asking for suggestions instead.";

/// Caller-supplied context: what "the current gap" means when a message says
/// an activity ended early, and which anchor to use when none is named.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub default_anchor: String,
    pub gap_free_time_min: u32,
    pub user_id: String,
    pub transcript_limit: usize,
}

impl SessionContext {
    fn gap_params(&self, message: Option<&str>) -> SuggestParams {
        SuggestParams {
            anchor_id: self.default_anchor.clone(),
            free_time_min: self.gap_free_time_min,
            message: message.map(str::to_string),
        }
    }
}

/// Parameters of one suggestion request; the last one is cached per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestParams {
    pub anchor_id: String,
    pub free_time_min: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of the local half of message handling.
#[derive(Debug)]
pub enum Routed {
    /// Handled locally and recorded in the transcript.
    Done(Reply),
    /// Needs the chat collaborator.
    Chat(Snapshot),
}

/// Catalog and ledger read under a single lock acquisition.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub sources: Vec<Source>,
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForgetOutcome {
    pub category: String,
    pub label: String,
    /// `false` when the category was already excluded.
    pub changed: bool,
    /// Names of the sources now hidden; they remain in the catalog.
    pub affected_sources: Vec<String>,
    pub exclusions: Vec<String>,
    pub catalog_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreOutcome {
    pub category: String,
    pub label: String,
    pub changed: bool,
    pub exclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetOutcome {
    pub cleared_exclusions: usize,
    pub cleared_sources: usize,
}

pub struct Session {
    db: Arc<Mutex<Connection>>,
    engine: Recommender,
    classifier: IntentClassifier,
    mirror: ExclusionMirror,
    chat: Arc<dyn ChatService>,
    context: SessionContext,
    last_request: Mutex<Option<SuggestParams>>,
    transcript: Mutex<Vec<ChatTurn>>,
}

impl Session {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        context: SessionContext,
        memory: Arc<dyn MemoryService>,
        chat: Arc<dyn ChatService>,
    ) -> Self {
        let mirror = ExclusionMirror::new(memory, context.user_id.clone());
        Self {
            db,
            engine: Recommender::default(),
            classifier: IntentClassifier::default(),
            mirror,
            chat,
            context,
            last_request: Mutex::new(None),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn with_engine(mut self, engine: Recommender) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn mirror(&self) -> &ExclusionMirror {
        &self.mirror
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| anyhow!("db lock poisoned: {e}"))
    }

    /// Catalog and exclusions as of now, read atomically.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let conn = self.conn()?;
        Ok(Snapshot {
            sources: store::list_sources(&conn)?,
            excluded: ledger::list_exclusions(&conn)?,
        })
    }

    // ── Suggestions ──────────────────────────────────────────────────────────

    /// Run the engine against the current snapshot and remember `params` as
    /// the most recent request.
    pub fn suggest(&self, params: SuggestParams) -> Result<SuggestOutcome> {
        let snapshot = self.snapshot()?;
        *lock(&self.last_request) = Some(params.clone());

        let outcome = self.engine.suggest(
            &snapshot.sources,
            &snapshot.excluded,
            &params.anchor_id,
            params.free_time_min,
            params.message.as_deref(),
        );

        tracing::info!(
            anchor_id = %params.anchor_id,
            free_time_min = params.free_time_min,
            excluded = ?outcome.debug.excluded_categories,
            results = ?outcome.debug.result_categories,
            "suggestions computed"
        );
        Ok(outcome)
    }

    /// Re-run a suggestion with `last` (normally [`Session::last_request`]),
    /// or with the gap-fill context when there is no previous request.
    pub fn resuggest(&self, last: Option<&SuggestParams>) -> Result<SuggestionBlock> {
        let params = last
            .cloned()
            .unwrap_or_else(|| self.context.gap_params(None));
        tracing::info!(anchor_id = %params.anchor_id, free_time_min = params.free_time_min, "re-suggesting");
        let outcome = self.suggest(params.clone())?;
        Ok(SuggestionBlock { params, outcome })
    }

    /// The cached parameters of the most recent suggestion request.
    pub fn last_request(&self) -> Option<SuggestParams> {
        lock(&self.last_request).clone()
    }

    // ── Exclusions ───────────────────────────────────────────────────────────

    /// Exclude a category. The local write completes before this returns; the
    /// mirror write and a verification read are dispatched afterwards.
    pub fn forget_category(&self, category: &str) -> Result<ForgetOutcome> {
        let category = category.trim();
        if category.is_empty() {
            bail!("category must not be empty");
        }

        let (changed, affected, exclusions, known, catalog_size) = {
            let conn = self.conn()?;
            let affected: Vec<String> = store::list_by_category(&conn, category)?
                .into_iter()
                .map(|s| s.name)
                .collect();
            let changed = ledger::add_exclusion(&conn, category)?;
            let exclusions = ledger::list_exclusions(&conn)?;
            let counts = store::category_counts(&conn)?;
            let catalog_size = counts.iter().map(|(_, n)| n).sum();
            let known: Vec<String> = counts.into_iter().map(|(c, _)| c).collect();
            (changed, affected, exclusions, known, catalog_size)
        };

        let label = category_label(category).to_string();
        tracing::info!(
            category,
            changed,
            affected = affected.len(),
            catalog_size,
            "category forgotten; sources kept in catalog"
        );

        if changed {
            self.mirror.record_exclusion(category, &label, &affected);
            self.mirror.spawn_verify(exclusions.clone(), known);
        }

        Ok(ForgetOutcome {
            category: category.to_string(),
            label,
            changed,
            affected_sources: affected,
            exclusions,
            catalog_size,
        })
    }

    pub fn restore_category(&self, category: &str) -> Result<RestoreOutcome> {
        let category = category.trim();
        let (changed, exclusions) = {
            let conn = self.conn()?;
            let changed = ledger::remove_exclusion(&conn, category)?;
            (changed, ledger::list_exclusions(&conn)?)
        };

        let label = category_label(category).to_string();
        if changed {
            tracing::info!(category, "category restored");
            self.mirror.record_restore(category, &label);
        }

        Ok(RestoreOutcome {
            category: category.to_string(),
            label,
            changed,
            exclusions,
        })
    }

    pub fn exclusions(&self) -> Result<Vec<String>> {
        ledger::list_exclusions(&*self.conn()?)
    }

    /// The most recent ledger changes, newest first.
    pub fn exclusion_history(&self, limit: usize) -> Result<Vec<ledger::ExclusionLogEntry>> {
        ledger::exclusion_history(&*self.conn()?, limit)
    }

    pub fn is_excluded(&self, category: &str) -> Result<bool> {
        ledger::is_excluded(&*self.conn()?, category)
    }

    /// Compare the remote memory with the ledger. Diagnostic only.
    pub async fn verify(&self) -> Result<VerifyReport> {
        let (local, known) = {
            let conn = self.conn()?;
            let local = ledger::list_exclusions(&conn)?;
            let known = store::category_counts(&conn)?
                .into_iter()
                .map(|(c, _)| c)
                .collect::<Vec<_>>();
            (local, known)
        };
        Ok(self.mirror.verify(&local, &known).await)
    }

    // ── Catalog ──────────────────────────────────────────────────────────────

    pub fn add_source(&self, new: &NewSource) -> Result<Source> {
        let source = store::add_source(&*self.conn()?, new)?;
        tracing::info!(id = %source.id, category = %source.category, "source added");
        self.mirror.record_source_added(&source);
        Ok(source)
    }

    pub fn remove_source(&self, id: &str) -> Result<Option<Source>> {
        let removed = store::remove_source(&*self.conn()?, id)?;
        if let Some(source) = &removed {
            tracing::info!(id, "source removed");
            self.mirror.record_source_removed(&source.name);
        }
        Ok(removed)
    }

    pub fn list_sources(&self, category: Option<&str>) -> Result<Vec<Source>> {
        let conn = self.conn()?;
        match category {
            Some(c) => store::list_by_category(&conn, c),
            None => store::list_sources(&conn),
        }
    }

    /// Replace the catalog from a trip document (also clears exclusions).
    pub fn import(&self, data: &TripImport) -> Result<ImportSummary> {
        import::import_trip(&*self.conn()?, data)
    }

    /// Clear exclusions, the last-request cache and the transcript; also the
    /// catalog when `include_catalog` is set.
    pub fn reset(&self, include_catalog: bool) -> Result<ResetOutcome> {
        let (cleared_exclusions, cleared_sources) = {
            let conn = self.conn()?;
            let cleared_exclusions = ledger::clear_exclusions(&conn)?;
            let cleared_sources = if include_catalog {
                store::clear_sources(&conn)?
            } else {
                0
            };
            (cleared_exclusions, cleared_sources)
        };
        *lock(&self.last_request) = None;
        lock(&self.transcript).clear();

        tracing::info!(cleared_exclusions, cleared_sources, "session reset");
        Ok(ResetOutcome {
            cleared_exclusions,
            cleared_sources,
        })
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    /// Route a free-text message and carry out the resulting action.
    pub async fn handle_message(&self, text: &str) -> Result<Reply> {
        match self.route_message(text)? {
            Routed::Done(reply) => Ok(reply),
            Routed::Chat(snapshot) => self.chat_message(text, snapshot).await,
        }
    }

    /// The synchronous half of [`Session::handle_message`]: classify and carry
    /// out every local action. Chat messages come back as [`Routed::Chat`]
    /// with the snapshot the chat request needs, and nothing is recorded yet.
    pub fn route_message(&self, text: &str) -> Result<Routed> {
        let intent = self.classifier.classify(text);
        tracing::info!(?intent, "message classified");

        let reply = match intent {
            Intent::GapFill => {
                let params = self.context.gap_params(Some(text));
                let outcome = self.suggest(params.clone())?;
                Reply::Suggestions(SuggestionBlock { params, outcome })
            }
            Intent::ForgetAndResuggest { category } => {
                if self.is_excluded(&category)? {
                    Reply::already_excluded(&category)
                } else {
                    let forget = self.forget_category(&category)?;
                    let last = self.last_request();
                    let block = self.resuggest(last.as_ref())?;
                    Reply::Forgot {
                        forget,
                        resuggest: Some(block),
                    }
                }
            }
            Intent::Forget { category } => {
                if self.is_excluded(&category)? {
                    Reply::already_excluded(&category)
                } else {
                    Reply::Forgot {
                        forget: self.forget_category(&category)?,
                        resuggest: None,
                    }
                }
            }
            Intent::Suggest {
                free_time_min,
                anchor_id,
            } => {
                let params = SuggestParams {
                    anchor_id: anchor_id.unwrap_or_else(|| self.context.default_anchor.clone()),
                    free_time_min,
                    message: Some(text.to_string()),
                };
                let outcome = self.suggest(params.clone())?;
                Reply::Suggestions(SuggestionBlock { params, outcome })
            }
            Intent::Chat => return Ok(Routed::Chat(self.snapshot()?)),
        };

        self.remember(ChatTurn::user(text), ChatTurn::assistant(reply.render()));
        Ok(Routed::Done(reply))
    }

    /// Forward to the chat collaborator with the non-excluded catalog and the
    /// exclusion list. Collaborator failures become a fixed reply.
    pub async fn chat_message(&self, text: &str, snapshot: Snapshot) -> Result<Reply> {
        let reply = self.chat(text, snapshot).await;
        self.remember(ChatTurn::user(text), ChatTurn::assistant(reply.render()));
        Ok(reply)
    }

    async fn chat(&self, text: &str, snapshot: Snapshot) -> Reply {
        let active: Vec<Source> = snapshot
            .sources
            .into_iter()
            .filter(|s| !snapshot.excluded.contains(&s.category))
            .collect();

        let mut messages = lock(&self.transcript).clone();
        messages.push(ChatTurn::user(text));

        let request = ChatRequest {
            messages,
            preferences: self.mirror.preferences(PREFERENCES_QUERY).await,
            sources: active,
            excluded_categories: snapshot.excluded,
        };

        match self.chat.chat(&request).await {
            Ok(answer) => {
                tracing::info!(
                    sources = request.sources.len(),
                    excluded = ?request.excluded_categories,
                    response_len = answer.len(),
                    "chat answered"
                );
                self.mirror
                    .record_conversation(MemoryRecord::exchange(text, answer.clone()));
                Reply::Chat {
                    text: answer,
                    delivered: true,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat collaborator failed");
                Reply::Chat {
                    text: CHAT_UNAVAILABLE.to_string(),
                    delivered: false,
                }
            }
        }
    }

    pub fn transcript(&self) -> Vec<ChatTurn> {
        lock(&self.transcript).clone()
    }

    fn remember(&self, user: ChatTurn, assistant: ChatTurn) {
        let mut transcript = lock(&self.transcript);
        transcript.push(user);
        transcript.push(assistant);
        // Whole user/assistant pairs only, so the transcript always starts with a user turn.
        let limit = self.context.transcript_limit.max(2) / 2 * 2;
        if transcript.len() > limit {
            let excess = transcript.len() - limit;
            transcript.drain(..excess);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
