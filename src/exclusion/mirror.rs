//! Asynchronous mirror of the exclusion ledger into the long-term memory service.
//!
//! Every method here runs after the local ledger write has already committed.
//! Mirror writes are spawned onto the tokio runtime and never awaited by the
//! caller; failures are logged and dropped. [`ExclusionMirror::verify`] compares
//! what the remote remembers against the local ledger and only reports.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::catalog::types::Source;
use crate::remote::memory::{MemoryRecord, MemoryService, RetrieveResponse};

const VERIFY_QUERY: &str =
    "Which categories has the user forgotten or excluded? List the excluded_categories.";

/// Shadows ledger and catalog changes into the memory service.
pub struct ExclusionMirror {
    service: Arc<dyn MemoryService>,
    user_id: String,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

/// Outcome of comparing the remote memory with the local ledger.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct VerifyReport {
    pub reachable: bool,
    pub items: usize,
    pub local: Vec<String>,
    /// Local exclusions the remote mentions.
    pub confirmed: Vec<String>,
    /// Local exclusions the remote does not mention.
    pub missing_remote: Vec<String>,
    /// Known categories the remote mentions but the ledger does not exclude.
    pub stale_remote: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyReport {
    fn compare(local: &[String], known: &[String], response: &RetrieveResponse) -> Self {
        let text = response.joined_text().unwrap_or_default().to_lowercase();
        let mentioned = |category: &str| text.contains(&category.to_lowercase());

        let (confirmed, missing_remote): (Vec<String>, Vec<String>) =
            local.iter().cloned().partition(|c| mentioned(c.as_str()));
        let stale_remote = known
            .iter()
            .filter(|c| !local.contains(*c) && mentioned(c.as_str()))
            .cloned()
            .collect();

        Self {
            reachable: true,
            items: response.items.len(),
            local: local.to_vec(),
            confirmed,
            missing_remote,
            stale_remote,
            error: None,
        }
    }

    fn unreachable(local: &[String], error: String) -> Self {
        Self {
            reachable: false,
            local: local.to_vec(),
            missing_remote: local.to_vec(),
            error: Some(error),
            ..Default::default()
        }
    }

    /// `true` when the remote agrees with the ledger.
    pub fn in_sync(&self) -> bool {
        self.reachable && self.missing_remote.is_empty() && self.stale_remote.is_empty()
    }
}

impl ExclusionMirror {
    pub fn new(service: Arc<dyn MemoryService>, user_id: impl Into<String>) -> Self {
        Self {
            service,
            user_id: user_id.into(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Mirror a newly excluded category with its label and the affected source names.
    pub fn record_exclusion(&self, category: &str, label: &str, affected: &[String]) {
        let source_list = if affected.is_empty() {
            String::new()
        } else {
            format!(" Affected sources: {}.", affected.join(", "))
        };
        let records = MemoryRecord::exchange(
            format!("{label} ({category}) is enough, forget all of it.{source_list}"),
            format!(
                "The user forgot the entire \"{label}\" ({category}) category.{source_list} \
                 Never suggest places in \"{label}\" again. Added \"{category}\" to excluded_categories."
            ),
        );
        tracing::info!(category, label, affected = affected.len(), "mirroring exclusion");
        self.dispatch("exclude", records);
    }

    pub fn record_restore(&self, category: &str, label: &str) {
        let records = MemoryRecord::exchange(
            format!("Bring back {label} ({category})."),
            format!(
                "The user restored the \"{label}\" ({category}) category. Removed \"{category}\" \
                 from excluded_categories; its places may be suggested again."
            ),
        );
        self.dispatch("restore", records);
    }

    pub fn record_source_added(&self, source: &Source) {
        let memo = if source.memo.is_empty() {
            String::new()
        } else {
            format!(" Memo: {}", source.memo)
        };
        let records = MemoryRecord::exchange(
            format!(
                "I want to go to \"{}\" (category: {}).{memo}",
                source.name, source.category
            ),
            format!(
                "Recorded \"{}\" as a source; it will be considered when planning.",
                source.name
            ),
        );
        self.dispatch("source_added", records);
    }

    pub fn record_source_removed(&self, name: &str) {
        let records = MemoryRecord::exchange(
            format!("Remove \"{name}\". I won't go there."),
            format!("The user removed \"{name}\" from their sources. Leave it out of itineraries."),
        );
        self.dispatch("source_removed", records);
    }

    /// Mirror an arbitrary conversation exchange (chat fallback).
    pub fn record_conversation(&self, records: Vec<MemoryRecord>) {
        self.dispatch("conversation", records);
    }

    /// Retrieve remembered preferences. Any failure yields `None`.
    pub async fn preferences(&self, query: &str) -> Option<String> {
        match self.service.retrieve(query, &self.user_id).await {
            Ok(response) => response.joined_text(),
            Err(e) => {
                tracing::warn!(error = %e, "preference retrieval failed");
                None
            }
        }
    }

    /// Ask the remote what it believes is excluded and compare with `local`.
    /// Never mutates local state.
    pub async fn verify(&self, local: &[String], known: &[String]) -> VerifyReport {
        verify_with(self.service.as_ref(), &self.user_id, local, known).await
    }

    /// Run [`verify`](Self::verify) in the background; the report is only logged.
    pub fn spawn_verify(&self, local: Vec<String>, known: Vec<String>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no async runtime, skipping exclusion verify");
            return;
        };
        let service = Arc::clone(&self.service);
        let user_id = self.user_id.clone();
        let task = handle.spawn(async move {
            verify_with(service.as_ref(), &user_id, &local, &known).await;
        });
        self.track(task);
    }

    /// Wait up to `timeout` for in-flight mirror tasks. Used by short-lived
    /// processes; servers simply let them run.
    pub async fn drain(&self, timeout: Duration) {
        let tasks: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let deadline = tokio::time::Instant::now() + timeout;
        for task in tasks {
            if tokio::time::timeout_at(deadline, task).await.is_err() {
                tracing::debug!("mirror drain timed out, abandoning remaining tasks");
                break;
            }
        }
    }

    fn dispatch(&self, action: &'static str, records: Vec<MemoryRecord>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(action, "no async runtime, skipping memory mirror");
            return;
        };
        let service = Arc::clone(&self.service);
        let user_id = self.user_id.clone();
        let task = handle.spawn(async move {
            match service.memorize(&records, &user_id).await {
                Ok(()) => tracing::debug!(action, "memory mirror recorded"),
                Err(e) => tracing::warn!(action, error = %e, "memory mirror failed"),
            }
        });
        self.track(task);
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|t| !t.is_finished());
        pending.push(task);
    }
}

async fn verify_with(
    service: &dyn MemoryService,
    user_id: &str,
    local: &[String],
    known: &[String],
) -> VerifyReport {
    let report = match service.retrieve(VERIFY_QUERY, user_id).await {
        Ok(response) => VerifyReport::compare(local, known, &response),
        Err(e) => VerifyReport::unreachable(local, e.to_string()),
    };

    if !report.reachable {
        tracing::warn!(error = ?report.error, "exclusion verify: memory service unreachable");
    } else if report.in_sync() {
        tracing::info!(confirmed = ?report.confirmed, "exclusion verify: remote agrees");
    } else {
        tracing::warn!(
            missing_remote = ?report.missing_remote,
            stale_remote = ?report.stale_remote,
            "exclusion verify: remote diverges from local ledger"
        );
    }
    report
}
