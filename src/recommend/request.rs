//! Caller-facing request shape for the stateless suggest operation.

use serde::Deserialize;
use thiserror::Error;

use super::engine::{Recommender, SuggestOutcome};
use crate::catalog::types::Source;

/// Malformed suggest input. Rejected before any computation runs.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("anchor_id must not be empty")]
    EmptyAnchor,

    #[error("free_time_min must be >= 0, got {0}")]
    NegativeFreeTime(i64),

    #[error("free_time_min is too large: {0}")]
    FreeTimeOutOfRange(i64),
}

/// `{sources, excludedCategories, anchor_id, free_time_min, message?}`.
///
/// Every field is optional at the serde level so that a missing field becomes
/// a typed [`InputError`] instead of a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestRequest {
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    #[serde(default, rename = "excludedCategories", alias = "excluded_categories")]
    pub excluded_categories: Vec<String>,
    #[serde(default)]
    pub anchor_id: Option<String>,
    #[serde(default)]
    pub free_time_min: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SuggestRequest {
    /// Validate and return `(anchor_id, free_time_min)`.
    pub fn validate(&self) -> Result<(&str, u32), InputError> {
        if self.sources.is_none() {
            return Err(InputError::MissingField("sources"));
        }
        let anchor = self
            .anchor_id
            .as_deref()
            .ok_or(InputError::MissingField("anchor_id"))?;
        if anchor.trim().is_empty() {
            return Err(InputError::EmptyAnchor);
        }
        let free = self
            .free_time_min
            .ok_or(InputError::MissingField("free_time_min"))?;
        if free < 0 {
            return Err(InputError::NegativeFreeTime(free));
        }
        let free = u32::try_from(free).map_err(|_| InputError::FreeTimeOutOfRange(free))?;
        Ok((anchor, free))
    }

    /// Validate, then run the engine over the request's own snapshot.
    pub fn run(&self, engine: &Recommender) -> Result<SuggestOutcome, InputError> {
        let (anchor, free) = self.validate()?;
        let sources = self.sources.as_deref().unwrap_or_default();
        Ok(engine.suggest(
            sources,
            &self.excluded_categories,
            anchor,
            free,
            self.message.as_deref(),
        ))
    }
}
