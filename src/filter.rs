//! Case-insensitive substring filtering of the option list.
//!
//! Matching works on lowercased chars, one text char at a time, so combining
//! marks and wide characters are compared as typed.

use crate::store::OptionStore;

/// Result of one filter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FilterOutcome {
    /// Store indices left visible, in display order.
    pub visible: Vec<usize>,
    /// Filtering is on and nothing matched.
    pub exhausted: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FilterEngine {
    enabled: bool,
}

impl FilterEngine {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Recompute every entry's visibility for `query`.
    pub fn apply(&self, store: &mut OptionStore, query: &str) -> FilterOutcome {
        let needle = fold_needle(query);

        let mut visible = Vec::new();
        for (index, entry) in store.iter_mut().enumerate() {
            entry.visible =
                !self.enabled || needle.is_empty() || find(&fold(&entry.text), &needle).is_some();
            if entry.visible {
                visible.push(index);
            }
        }

        let exhausted = self.enabled && visible.is_empty();
        tracing::trace!(query = query.trim(), visible = visible.len(), "filter applied");
        FilterOutcome { visible, exhausted }
    }

    /// Char indices of `text` covered by the query, for highlighting.
    pub fn match_indices(&self, text: &str, query: &str) -> Vec<u32> {
        let needle = fold_needle(query);
        if !self.enabled || needle.is_empty() {
            return Vec::new();
        }
        let haystack = fold(text);
        let Some(start) = find(&haystack, &needle) else {
            return Vec::new();
        };
        let mut indices: Vec<u32> = haystack[start..start + needle.len()]
            .iter()
            .map(|&(_, index)| index)
            .collect();
        indices.dedup();
        indices
    }
}

/// Lowercased chars of `text`, each tagged with the index of its source char.
fn fold(text: &str) -> Vec<(char, u32)> {
    text.chars()
        .enumerate()
        .flat_map(|(index, c)| c.to_lowercase().map(move |lower| (lower, index as u32)))
        .collect()
}

fn fold_needle(query: &str) -> Vec<char> {
    query.trim().chars().flat_map(char::to_lowercase).collect()
}

/// Position in `haystack` of the first run equal to `needle`.
fn find(haystack: &[(char, u32)], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window.iter().map(|&(c, _)| c).eq(needle.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fruit() -> OptionStore {
        OptionStore::from_texts(["Apple", "Banana", "Cherry", "Pineapple"])
    }

    #[test]
    fn test_empty_query_matches_all() {
        let mut store = fruit();
        let outcome = FilterEngine::new(true).apply(&mut store, "   ");
        assert_eq!(outcome.visible, vec![0, 1, 2, 3]);
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_substring_is_case_insensitive() {
        let mut store = fruit();
        let outcome = FilterEngine::new(true).apply(&mut store, "APPLE");
        assert_eq!(outcome.visible, vec![0, 3]);
        assert!(!store.get(1).unwrap().is_visible());
    }

    #[test]
    fn test_query_is_trimmed() {
        let mut store = fruit();
        let outcome = FilterEngine::new(true).apply(&mut store, "  nan ");
        assert_eq!(outcome.visible, vec![1]);
    }

    #[test]
    fn test_substring_not_fuzzy() {
        let mut store = fruit();
        // "ae" is a subsequence of "Apple" but not a substring
        let outcome = FilterEngine::new(true).apply(&mut store, "ae");
        assert!(outcome.visible.is_empty());
        assert!(outcome.exhausted);
    }

    #[test]
    fn test_disabled_filter_shows_everything() {
        let mut store = fruit();
        let outcome = FilterEngine::new(false).apply(&mut store, "zzz");
        assert_eq!(outcome.visible.len(), 4);
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_filter_never_shows_more_than_unfiltered() {
        for query in ["", "a", "an", "x", "PINE", "e", " c "] {
            let mut store = fruit();
            let filtered = FilterEngine::new(true).apply(&mut store, query).visible.len();
            let unfiltered = FilterEngine::new(false).apply(&mut store, query).visible.len();
            assert!(filtered <= unfiltered, "query {query:?}");
        }
    }

    #[test]
    fn test_match_indices() {
        let engine = FilterEngine::new(true);
        assert_eq!(engine.match_indices("Pineapple", "app"), vec![4, 5, 6]);
        assert!(engine.match_indices("Banana", "").is_empty());
        assert!(engine.match_indices("Banana", "x").is_empty());
    }

    #[test]
    fn test_combining_marks_match() {
        let mut store = OptionStore::from_texts(["Cafe\u{301}", "Cafe", "Cafe\u{301} au lait"]);
        let outcome = FilterEngine::new(true).apply(&mut store, "e\u{301}");
        assert_eq!(outcome.visible, vec![0, 2]);

        let outcome = FilterEngine::new(true).apply(&mut store, "CAFE\u{301}");
        assert_eq!(outcome.visible, vec![0, 2]);
    }

    #[test]
    fn test_unicode_case_folding() {
        let mut store = OptionStore::from_texts(["ÉCLAIR", "Straße", "ΣΟΦΙΑ", "éclair"]);
        let outcome = FilterEngine::new(true).apply(&mut store, "écl");
        assert_eq!(outcome.visible, vec![0, 3]);

        let outcome = FilterEngine::new(true).apply(&mut store, "σοφ");
        assert_eq!(outcome.visible, vec![2]);

        let outcome = FilterEngine::new(true).apply(&mut store, "STRAẞE");
        assert_eq!(outcome.visible, vec![1]);
    }

    #[test]
    fn test_inner_whitespace_is_part_of_query() {
        let mut store = OptionStore::from_texts(["Pecan apple", "Banana", "Pecan"]);
        let outcome = FilterEngine::new(true).apply(&mut store, " an a ");
        assert_eq!(outcome.visible, vec![0]);
    }

    #[test]
    fn test_match_indices_cover_combining_marks() {
        let engine = FilterEngine::new(true);
        assert_eq!(engine.match_indices("Cafe\u{301}", "fe\u{301}"), vec![2, 3, 4]);
        assert_eq!(engine.match_indices("日本語", "本"), vec![1]);
    }
}
