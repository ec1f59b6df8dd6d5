//! What a message produced, plus its plain-text rendering.

use serde::Serialize;
use std::fmt::Write;

use super::{ForgetOutcome, SuggestParams};
use crate::catalog::types::category_label;
use crate::recommend::SuggestOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionBlock {
    pub params: SuggestParams,
    pub outcome: SuggestOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Suggestions(SuggestionBlock),
    Forgot {
        forget: ForgetOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        resuggest: Option<SuggestionBlock>,
    },
    AlreadyExcluded {
        category: String,
        label: String,
    },
    Chat {
        text: String,
        /// `false` when the chat collaborator failed and `text` is the fallback.
        delivered: bool,
    },
}

impl Reply {
    pub(crate) fn already_excluded(category: &str) -> Self {
        Reply::AlreadyExcluded {
            category: category.to_string(),
            label: category_label(category).to_string(),
        }
    }

    /// The suggestions this reply carries, if any.
    pub fn suggestions(&self) -> Option<&SuggestionBlock> {
        match self {
            Reply::Suggestions(block) => Some(block),
            Reply::Forgot { resuggest, .. } => resuggest.as_ref(),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Reply::Suggestions(block) => block.render(),
            Reply::Forgot { forget, resuggest } => {
                let mut out = format!("Forgot the \"{}\" category.\n", forget.label);
                if forget.affected_sources.is_empty() {
                    out.push_str("- no registered sources were affected\n");
                } else {
                    let _ = writeln!(
                        out,
                        "- {} hidden from suggestions: {}",
                        forget.affected_sources.len(),
                        forget.affected_sources.join(", ")
                    );
                }
                let _ = writeln!(out, "- {} sources kept in the catalog", forget.catalog_size);
                let _ = write!(out, "- excluded: [{}]", forget.exclusions.join(", "));
                if let Some(block) = resuggest {
                    out.push_str("\n\n");
                    out.push_str(&block.render());
                }
                out
            }
            Reply::AlreadyExcluded { label, .. } => {
                format!("\"{label}\" is already forgotten.")
            }
            Reply::Chat { text, .. } => text.clone(),
        }
    }
}

impl SuggestionBlock {
    pub fn render(&self) -> String {
        let anchor = self
            .params
            .anchor_id
            .strip_prefix("anchor_")
            .unwrap_or(&self.params.anchor_id);
        let mut out = format!(
            "Suggestions for {}min around {}\n",
            self.params.free_time_min, anchor
        );

        if self.outcome.suggestions.is_empty() {
            out.push_str("\nNothing fits right now.\n");
        }
        for (i, s) in self.outcome.suggestions.iter().enumerate() {
            let _ = write!(
                out,
                "\n{}. {} [{}]\n   ~{}min | {}\n",
                i + 1,
                s.title,
                category_label(&s.category),
                s.duration_min,
                s.reason
            );
        }

        let debug = &self.outcome.debug;
        let _ = write!(
            out,
            "\nexcluded: [{}] | candidates: {}",
            debug.excluded_categories.join(", "),
            debug.after_duration
        );
        out
    }
}
