//! Message routing: decide whether free text asks for suggestions, asks to
//! forget a category, or is ordinary conversation.

pub mod classifier;
pub mod lexicon;

pub use classifier::{Intent, IntentClassifier};
pub use lexicon::{CategoryLexicon, CueLexicon, KeywordCategories, KeywordCues, KeywordList};
