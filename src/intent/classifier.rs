//! First-match-wins decision table over a free-text message.
//!
//! Specific compound patterns are checked before generic ones: a message that
//! matches both the gap-fill phrase and the generic forget pattern must route
//! to gap-fill.

use regex::Regex;
use serde::Serialize;

use super::lexicon::{CategoryLexicon, CueLexicon, KeywordCategories, KeywordCues, KeywordList};

/// What a message asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    /// An activity ended early; fill the gap using the session's context.
    GapFill,
    /// Forget a category, then re-run the most recent suggestion request.
    ForgetAndResuggest { category: String },
    /// Forget a category.
    Forget { category: String },
    /// Suggest for an explicit time budget; `anchor_id` falls back to the
    /// session default when absent.
    Suggest {
        free_time_min: u32,
        anchor_id: Option<String>,
    },
    /// No local action; hand to the chat collaborator.
    Chat,
}

pub struct IntentClassifier {
    categories: Box<dyn CategoryLexicon>,
    cues: Box<dyn CueLexicon>,
    gap_subjects: KeywordList,
    gap_phrases: KeywordList,
    suggest_cues: KeywordList,
    duration: Regex,
    anchor: Regex,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(
            Box::new(KeywordCategories::builtin()),
            Box::new(KeywordCues::default()),
        )
    }
}

impl IntentClassifier {
    pub fn new(categories: Box<dyn CategoryLexicon>, cues: Box<dyn CueLexicon>) -> Self {
        Self {
            categories,
            cues,
            gap_subjects: KeywordList::new(&["ミュージアム", "museum", "美術館"]),
            gap_phrases: KeywordList::new(&[
                "早く終わった", "早く終わる", "早く終わ", "どこ行こう",
                "ended early", "finished early", "done early", "closed early",
            ]),
            suggest_cues: KeywordList::new(&[
                "空いた", "おすすめ", "提案", "行ける", "どこ行",
                "suggest", "recommend", "where should",
            ]),
            duration: Regex::new(r"(\d+)\s*(?:分|min)").expect("valid duration regex"),
            anchor: Regex::new(r"anchor_\w+").expect("valid anchor regex"),
        }
    }

    /// Replace the gap-fill trigger tables (subject keywords and "ended early" phrases).
    pub fn with_gap_triggers(mut self, subjects: &[&str], phrases: &[&str]) -> Self {
        self.gap_subjects = KeywordList::new(subjects);
        self.gap_phrases = KeywordList::new(phrases);
        self
    }

    pub fn classify(&self, message: &str) -> Intent {
        let lower = message.to_lowercase();

        if self.gap_subjects.matches(&lower) && self.gap_phrases.matches(&lower) {
            return Intent::GapFill;
        }

        let category = self.categories.detect(&lower);

        if let Some(category) = &category {
            if self.cues.has_resuggest_cue(&lower) {
                return Intent::ForgetAndResuggest {
                    category: category.clone(),
                };
            }
            if self.cues.has_forget_cue(&lower) {
                return Intent::Forget {
                    category: category.clone(),
                };
            }
        }

        if let Some(free_time_min) = self.free_time(&lower) {
            if self.suggest_cues.matches(&lower) {
                let anchor_id = self.anchor.find(message).map(|m| m.as_str().to_string());
                return Intent::Suggest {
                    free_time_min,
                    anchor_id,
                };
            }
        }

        Intent::Chat
    }

    fn free_time(&self, message: &str) -> Option<u32> {
        self.duration
            .captures(message)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
