//! Filter → score → rank → truncate → explain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keywords::IntentKeywords;
use crate::catalog::types::{Source, DEFAULT_DURATION_MIN};

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

const PRIORITY_WEIGHT: f64 = 10.0;
const ANCHOR_BONUS: f64 = 30.0;
const FIT_BONUS_WEIGHT: f64 = 15.0;
const INTENT_BONUS: f64 = 20.0;
const HIGH_PRIORITY: i64 = 4;
const REASON_SEPARATOR: &str = " / ";
const FALLBACK_REASON: &str = "usable nearby";

/// A ranked, explained recommendation. Derived on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub category: String,
    /// The source's duration, or 30 when it declares none.
    pub duration_min: u32,
    pub reason: String,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
    pub priority: i64,
    pub score: f64,
}

/// Pipeline counters returned alongside every result so callers can verify
/// that no excluded category leaked through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestDebug {
    pub total_sources: usize,
    pub excluded_categories: Vec<String>,
    pub excluded_source_count: usize,
    pub after_exclude: usize,
    pub after_duration: usize,
    pub result_categories: Vec<String>,
    pub leaked_categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestOutcome {
    pub suggestions: Vec<Suggestion>,
    pub debug: SuggestDebug,
}

/// An excluded category appeared in computed results. Always a bug.
#[derive(Debug, Error, PartialEq)]
#[error("excluded categories leaked into results: {}", categories.join(", "))]
pub struct ExclusionLeak {
    pub categories: Vec<String>,
}

/// Verify that no suggestion carries an excluded category.
pub fn check_no_leak(suggestions: &[Suggestion], excluded: &[String]) -> Result<(), ExclusionLeak> {
    let mut leaked: Vec<String> = Vec::new();
    for s in suggestions {
        if excluded.contains(&s.category) && !leaked.contains(&s.category) {
            leaked.push(s.category.clone());
        }
    }
    if leaked.is_empty() {
        Ok(())
    } else {
        Err(ExclusionLeak { categories: leaked })
    }
}

/// The recommendation engine. Holds only the intent keyword table.
#[derive(Debug, Clone)]
pub struct Recommender {
    keywords: IntentKeywords,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(IntentKeywords::builtin())
    }
}

impl Recommender {
    pub fn new(keywords: IntentKeywords) -> Self {
        Self { keywords }
    }

    /// Rank `sources` for the given anchor and free time, never returning a
    /// category in `excluded`.
    pub fn suggest(
        &self,
        sources: &[Source],
        excluded: &[String],
        anchor_id: &str,
        free_time_min: u32,
        message: Option<&str>,
    ) -> SuggestOutcome {
        // 1. Exclusion filter: absolute, applied before anything else.
        let after_exclude: Vec<&Source> = sources
            .iter()
            .filter(|s| !excluded.contains(&s.category))
            .collect();
        let excluded_source_count = sources.len() - after_exclude.len();

        // 2. Feasibility: undeclared durations always fit.
        let feasible: Vec<&Source> = after_exclude
            .iter()
            .copied()
            .filter(|s| s.declared_duration().map_or(true, |d| d <= free_time_min))
            .collect();

        // 3. Score.
        let boosted = message
            .map(|m| self.keywords.matching_categories(m))
            .unwrap_or_default();
        let mut scored: Vec<(&Source, f64)> = feasible
            .iter()
            .map(|s| (*s, score(s, anchor_id, free_time_min, &boosted)))
            .collect();

        // 4. Rank. sort_by is stable, so ties keep catalog order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        // 5 + 6. Truncate and explain.
        let suggestions: Vec<Suggestion> = scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(s, score)| Suggestion {
                title: s.name.clone(),
                category: s.category.clone(),
                duration_min: s.declared_duration().unwrap_or(DEFAULT_DURATION_MIN),
                reason: build_reason(s, anchor_id, free_time_min),
                source_id: s.id.clone(),
                anchor_id: s.anchor_id.clone(),
                priority: s.effective_priority(),
                score,
            })
            .collect();

        let leaked_categories = match check_no_leak(&suggestions, excluded) {
            Ok(()) => Vec::new(),
            Err(leak) => {
                tracing::error!(error = %leak, "exclusion invariant violated");
                debug_assert!(false, "{leak}");
                leak.categories
            }
        };

        tracing::debug!(
            anchor_id,
            free_time_min,
            total = sources.len(),
            after_exclude = after_exclude.len(),
            after_duration = feasible.len(),
            results = suggestions.len(),
            "suggest computed"
        );

        SuggestOutcome {
            debug: SuggestDebug {
                total_sources: sources.len(),
                excluded_categories: excluded.to_vec(),
                excluded_source_count,
                after_exclude: after_exclude.len(),
                after_duration: feasible.len(),
                result_categories: suggestions.iter().map(|s| s.category.clone()).collect(),
                leaked_categories,
            },
            suggestions,
        }
    }
}

/// Rank with the built-in keyword table.
pub fn suggest(
    sources: &[Source],
    excluded: &[String],
    anchor_id: &str,
    free_time_min: u32,
    message: Option<&str>,
) -> SuggestOutcome {
    Recommender::default().suggest(sources, excluded, anchor_id, free_time_min, message)
}

fn score(source: &Source, anchor_id: &str, free_time_min: u32, boosted: &[&str]) -> f64 {
    let mut score = source.effective_priority() as f64 * PRIORITY_WEIGHT;

    if source.anchor_id.as_deref() == Some(anchor_id) {
        score += ANCHOR_BONUS;
    }

    // Longer feasible durations earn more: rewards using the window, not just fitting it.
    if let Some(duration) = fitting_duration(source, free_time_min) {
        score += FIT_BONUS_WEIGHT * (duration as f64 / free_time_min as f64);
    }

    if boosted.contains(&source.category.as_str()) {
        score += INTENT_BONUS;
    }

    score
}

/// The declared duration when it fits the window. `free_time_min` is then
/// necessarily positive, since zero durations count as undeclared.
fn fitting_duration(source: &Source, free_time_min: u32) -> Option<u32> {
    source.declared_duration().filter(|d| *d <= free_time_min)
}

fn build_reason(source: &Source, anchor_id: &str, free_time_min: u32) -> String {
    let mut parts: Vec<String> = Vec::new();
    if source.anchor_id.as_deref() == Some(anchor_id) {
        parts.push("near current anchor".into());
    }
    if let Some(duration) = fitting_duration(source, free_time_min) {
        parts.push(format!("fits remaining time (~{duration}min)"));
    }
    if source.declared_priority().is_some_and(|p| p >= HIGH_PRIORITY) {
        parts.push("high priority".into());
    }
    if !source.memo.is_empty() {
        parts.push(source.memo.clone());
    }

    if parts.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        parts.join(REASON_SEPARATOR)
    }
}
