//! Abstract reconstruction.
//!
//! OpenAlex ships abstracts as an inverted index (word → positions) for
//! legal reasons. This module turns that back into plain text and bounds it
//! to the length kept in the output document.

use std::collections::HashMap;

/// Word → positions at which the word occurs in the abstract.
pub type InvertedIndex = HashMap<String, Vec<u32>>;

/// Text used when a work carries no abstract.
pub const NO_ABSTRACT: &str = "No abstract available.";

/// Maximum abstract length, in characters, kept per article.
pub const MAX_ABSTRACT_CHARS: usize = 300;

const ELLIPSIS: &str = "...";

/// Reconstruct abstract text from an inverted index.
///
/// Every occurrence becomes one `(position, word)` pair; pairs are ordered by
/// position and joined with single spaces. Map iteration order never leaks
/// into the result.
pub fn reconstruct_abstract(inverted_index: Option<&InvertedIndex>) -> String {
    let Some(index) = inverted_index else {
        return NO_ABSTRACT.to_string();
    };

    let mut words: Vec<(u32, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |p| (*p, word.as_str())))
        .collect();

    if words.is_empty() {
        return NO_ABSTRACT.to_string();
    }

    // Positions are unique per source guarantee, so an unstable sort is fine.
    words.sort_unstable_by_key(|(pos, _)| *pos);
    words.iter().map(|(_, w)| *w).collect::<Vec<_>>().join(" ")
}

/// Bound an abstract to [`MAX_ABSTRACT_CHARS`] characters.
///
/// Longer text keeps its first 297 characters followed by `"..."`.
pub fn truncate_abstract(text: String) -> String {
    if text.chars().count() <= MAX_ABSTRACT_CHARS {
        return text;
    }
    let keep = MAX_ABSTRACT_CHARS - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: Vec<(&str, Vec<u32>)>) -> InvertedIndex {
        entries
            .into_iter()
            .map(|(w, p)| (w.to_string(), p))
            .collect()
    }

    #[test]
    fn test_reconstruct_orders_by_position() {
        let idx = index(vec![("hello", vec![1]), ("world", vec![0])]);
        assert_eq!(reconstruct_abstract(Some(&idx)), "world hello");
    }

    #[test]
    fn test_reconstruct_ignores_insertion_order() {
        let forward = index(vec![("the", vec![0, 3]), ("cat", vec![1]), ("saw", vec![2]), ("dog", vec![4])]);
        let reverse = index(vec![("dog", vec![4]), ("saw", vec![2]), ("cat", vec![1]), ("the", vec![3, 0])]);
        assert_eq!(reconstruct_abstract(Some(&forward)), "the cat saw the dog");
        assert_eq!(reconstruct_abstract(Some(&reverse)), "the cat saw the dog");
    }

    #[test]
    fn test_reconstruct_with_position_gaps() {
        let idx = index(vec![("late", vec![40]), ("early", vec![2]), ("middle", vec![17])]);
        assert_eq!(reconstruct_abstract(Some(&idx)), "early middle late");
    }

    #[test]
    fn test_reconstruct_absent_or_empty() {
        assert_eq!(reconstruct_abstract(None), NO_ABSTRACT);
        assert_eq!(reconstruct_abstract(Some(&InvertedIndex::new())), NO_ABSTRACT);
        let no_positions = index(vec![("orphan", vec![])]);
        assert_eq!(reconstruct_abstract(Some(&no_positions)), NO_ABSTRACT);
    }

    #[test]
    fn test_truncate_long_abstract() {
        let text = "a".repeat(450);
        let out = truncate_abstract(text);
        assert_eq!(out.chars().count(), MAX_ABSTRACT_CHARS);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..297], "a".repeat(297));
    }

    #[test]
    fn test_truncate_keeps_short_and_boundary() {
        assert_eq!(truncate_abstract("short".to_string()), "short");
        let exact = "b".repeat(MAX_ABSTRACT_CHARS);
        assert_eq!(truncate_abstract(exact.clone()), exact);
        let over = "c".repeat(MAX_ABSTRACT_CHARS + 1);
        assert_eq!(truncate_abstract(over).chars().count(), MAX_ABSTRACT_CHARS);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        // 200 two-byte characters stay untouched
        let accented = "é".repeat(200);
        assert_eq!(truncate_abstract(accented.clone()), accented);

        let long = "ü".repeat(320);
        let out = truncate_abstract(long);
        assert_eq!(out.chars().count(), MAX_ABSTRACT_CHARS);
        assert!(out.starts_with("üü"));
        assert!(out.ends_with("ü..."));
    }
}
