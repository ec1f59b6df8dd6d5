//! Recommendation engine.
//!
//! [`engine::Recommender::suggest`] is a pure function of a catalog snapshot, an
//! exclusion snapshot, an anchor, a free-time budget and an optional message.
//! The exclusion filter runs first and nothing downstream can reintroduce an
//! excluded category; [`engine::check_no_leak`] re-verifies that on every result.
//!
//! - [`keywords`]: the message-keyword table behind the intent bonus
//! - [`request`]: the caller-facing request shape and its validation

pub mod engine;
pub mod keywords;
pub mod request;

pub use engine::{
    check_no_leak, suggest, ExclusionLeak, Recommender, SuggestDebug, SuggestOutcome, Suggestion,
    MAX_SUGGESTIONS,
};
pub use request::{InputError, SuggestRequest};
