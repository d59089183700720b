//! Fuzzy matching utilities
//!
//! Edit-distance similarity used by both the guided matcher and the
//! rule-based NLU, plus the text normalization they share.

use strsim::normalized_levenshtein;

/// Normalize text for matching: trim surrounding whitespace, lowercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Similarity score between two strings in `[0, 1]`.
///
/// `1 - levenshtein(a, b) / max(|a|, |b|)`. Both empty yields 1.0, exactly
/// one empty yields 0.0. Inputs are compared as-is; callers normalize first.
pub fn similarity(a: &str, b: &str) -> f32 {
    normalized_levenshtein(a, b) as f32
}

/// Strip trailing ASCII punctuation from an extracted value.
pub fn strip_trailing_punctuation(text: &str) -> &str {
    text.trim_end_matches(|c: char| c.is_ascii_punctuation())
}

/// Join up to `max_words` whitespace-delimited words starting at `words[start]`,
/// stripping trailing punctuation from the result.
pub fn take_words(words: &[&str], start: usize, max_words: usize) -> String {
    let taken: Vec<&str> = words.iter().skip(start).take(max_words).copied().collect();
    strip_trailing_punctuation(&taken.join(" ")).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert!((similarity("zoom to", "zoom to") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let pairs = [("play", "plate"), ("", "help"), ("show help", "")];
        for (a, b) in pairs {
            let ab = similarity(a, b);
            let ba = similarity(b, a);
            assert!((ab - ba).abs() < f32::EPSILON, "asymmetric for {a:?}/{b:?}");
            assert!((0.0..=1.0).contains(&ab), "out of range for {a:?}/{b:?}");
        }
    }

    #[test]
    fn empty_edge_cases() {
        assert!((similarity("", "") - 1.0).abs() < f32::EPSILON);
        assert_eq!(similarity("", "anything"), 0.0);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Zoom To 15 \n"), "zoom to 15");
    }

    #[test]
    fn strips_trailing_punctuation_only() {
        assert_eq!(strip_trailing_punctuation("green."), "green");
        assert_eq!(strip_trailing_punctuation("st. louis"), "st. louis");
        assert_eq!(strip_trailing_punctuation("done!?"), "done");
    }

    #[test]
    fn take_words_caps_and_strips() {
        let words: Vec<&str> = "the red barn door.".split_whitespace().collect();
        assert_eq!(take_words(&words, 1, 3), "red barn door");
        assert_eq!(take_words(&words, 3, 4), "door");
        assert_eq!(take_words(&words, 9, 3), "");
    }
}
