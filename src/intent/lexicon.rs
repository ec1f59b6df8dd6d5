//! Lookup tables used by the classifier.
//!
//! Category detection and forget/re-suggest cue detection are separate
//! strategies so either table can be replaced or extended without touching
//! the classifier's control flow. All lookups receive a lowercased message.

/// Finds the category a message talks about.
pub trait CategoryLexicon: Send + Sync {
    fn detect(&self, message: &str) -> Option<String>;
}

/// Recognizes "I don't want this anymore" and "suggest something else" cues.
pub trait CueLexicon: Send + Sync {
    fn has_forget_cue(&self, message: &str) -> bool;
    fn has_resuggest_cue(&self, message: &str) -> bool;
}

/// A plain list of lowercase keywords matched by substring.
#[derive(Debug, Clone, Default)]
pub struct KeywordList(Vec<String>);

impl KeywordList {
    pub fn new(keywords: &[&str]) -> Self {
        Self(keywords.iter().map(|k| k.to_lowercase()).collect())
    }

    pub fn matches(&self, message: &str) -> bool {
        self.0.iter().any(|k| message.contains(k.as_str()))
    }
}

/// Keyword → category table, checked in insertion order.
#[derive(Debug, Clone, Default)]
pub struct KeywordCategories {
    entries: Vec<(String, String)>,
}

impl KeywordCategories {
    pub fn builtin() -> Self {
        Self::default()
            .with("cafe", &["カフェ", "cafe", "café", "coffee", "コーヒー"])
            .with("food", &["グルメ", "食事", "レストラン", "restaurant"])
            .with("museum", &["museum", "美術館", "博物館", "gallery"])
            .with("park", &["公園", "park"])
            .with("market", &["market", "マーケット", "市場"])
    }

    pub fn with(mut self, category: &str, keywords: &[&str]) -> Self {
        self.entries.extend(
            keywords
                .iter()
                .map(|k| (k.to_lowercase(), category.to_string())),
        );
        self
    }
}

impl CategoryLexicon for KeywordCategories {
    fn detect(&self, message: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(keyword, _)| message.contains(keyword.as_str()))
            .map(|(_, category)| category.clone())
    }
}

/// Built-in forget and re-suggest cue lists.
#[derive(Debug, Clone)]
pub struct KeywordCues {
    pub forget: KeywordList,
    pub resuggest: KeywordList,
}

impl Default for KeywordCues {
    fn default() -> Self {
        Self {
            forget: KeywordList::new(&[
                "いらない", "忘却", "忘れて", "除外", "不要", "やめ", "消して", "十分",
                "forget", "exclude", "no longer", "don't want",
            ]),
            resuggest: KeywordList::new(&[
                "十分", "別の", "いらない", "忘れて", "忘却",
                "enough", "forget",
            ]),
        }
    }
}

impl CueLexicon for KeywordCues {
    fn has_forget_cue(&self, message: &str) -> bool {
        self.forget.matches(message)
    }

    fn has_resuggest_cue(&self, message: &str) -> bool {
        self.resuggest.matches(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_table_entry_wins() {
        let table = KeywordCategories::builtin();
        assert_eq!(table.detect("coffee then museum").as_deref(), Some("cafe"));
        assert_eq!(table.detect("公園に行きたい").as_deref(), Some("park"));
        assert_eq!(table.detect("nothing here"), None);
    }

    #[test]
    fn custom_category_table() {
        let table = KeywordCategories::default().with("bookstore", &["Books"]);
        assert_eq!(table.detect("any books around").as_deref(), Some("bookstore"));
        assert_eq!(table.detect("coffee"), None);
    }

    #[test]
    fn cue_lists_are_independent() {
        let cues = KeywordCues::default();
        assert!(cues.has_forget_cue("please exclude it"));
        assert!(!cues.has_resuggest_cue("please exclude it"));
        assert!(cues.has_resuggest_cue("that's enough"));
        assert!(!cues.has_forget_cue("that's enough"));
    }

    #[test]
    fn asking_for_alternatives_is_not_a_rejection() {
        let cues = KeywordCues::default();
        for msg in [
            "Can you suggest a cafe instead?",
            "I'd rather do a museum instead",
            "coffee or something else for 30 min, suggest",
            "no more than 30 min please",
        ] {
            assert!(!cues.has_forget_cue(msg), "{msg}");
            assert!(!cues.has_resuggest_cue(msg), "{msg}");
        }
        assert!(cues.has_forget_cue("I no longer want coffee"));
    }
}
