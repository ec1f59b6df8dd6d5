//! Message keywords that boost a category during scoring.

/// Data-driven keyword table: category → keywords. Matching is a
/// case-insensitive substring test against the whole message.
#[derive(Debug, Clone, Default)]
pub struct IntentKeywords {
    entries: Vec<(String, Vec<String>)>,
}

impl IntentKeywords {
    /// An empty table (no intent bonus ever applies).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table covering cafe, museum and market.
    pub fn builtin() -> Self {
        Self::empty()
            .with_category("cafe", &["カフェ", "coffee", "cafe", "café", "コーヒー"])
            .with_category("museum", &["museum", "gallery", "美術館", "博物館", "ミュージアム"])
            .with_category("market", &["market", "マーケット", "市場"])
    }

    /// Add keywords for a category, extending any existing entry.
    pub fn with_category(mut self, category: &str, keywords: &[&str]) -> Self {
        let lowered = keywords.iter().map(|k| k.to_lowercase());
        match self.entries.iter_mut().find(|(c, _)| c == category) {
            Some((_, existing)) => existing.extend(lowered),
            None => self.entries.push((category.to_string(), lowered.collect())),
        }
        self
    }

    /// Every category with at least one keyword hit in `message`.
    pub fn matching_categories(&self, message: &str) -> Vec<&str> {
        let message = message.to_lowercase();
        self.entries
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| message.contains(k.as_str())))
            .map(|(category, _)| category.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        let table = IntentKeywords::builtin();
        assert_eq!(table.matching_categories("Any good COFFEE nearby?"), vec!["cafe"]);
    }

    #[test]
    fn one_message_can_match_several_categories() {
        let table = IntentKeywords::builtin();
        let hits = table.matching_categories("美術館のあとにマーケットかカフェ");
        assert_eq!(hits, vec!["cafe", "museum", "market"]);
    }

    #[test]
    fn no_hits_for_unrelated_message() {
        assert!(IntentKeywords::builtin().matching_categories("hello").is_empty());
        assert!(IntentKeywords::empty().matching_categories("coffee").is_empty());
    }

    #[test]
    fn with_category_extends_existing_entry() {
        let table = IntentKeywords::builtin().with_category("cafe", &["Espresso"]);
        assert_eq!(table.matching_categories("espresso please"), vec!["cafe"]);
        let table = table.with_category("park", &["garden"]);
        assert_eq!(table.matching_categories("a garden walk"), vec!["park"]);
    }
}
