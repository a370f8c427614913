// Fuzzy similarity scoring — integer scores on the 0–100 scale.
//
// The combined score is the floored mean of two complementary sub-scores:
// a partial-overlap score (best-aligned substring of the longer string
// against the shorter) and a token-set score (vocabulary overlap with word
// order and duplicates ignored). Partial overlap catches a short keyword
// buried in a long utterance; token-set catches reordered phrases like
// "cancel my subscription please" against "cancel subscription".
//
// Both sub-scores bottom out on strsim's normalized Levenshtein distance.
// Inputs are expected to be normalized already (see normalize.rs); raw
// text works too, it just scores worse.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Minimum combined score for a keyword/segment pair to count as a match.
pub const MATCH_THRESHOLD: u32 = 85;

/// Plain edit similarity of two strings, expressed 0–100.
/// An empty side scores 0 against anything, including another empty string.
fn ratio(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (normalized_levenshtein(a, b) * 100.0).round() as u32
}

/// Best-aligned-substring similarity: slide the shorter string across every
/// same-length window of the longer string and keep the best edit
/// similarity. 0–100.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (a, &b_chars)
    } else {
        (b, &a_chars)
    };
    let window_len = shorter.chars().count();

    if window_len == longer.len() {
        return ratio(a, b);
    }

    let mut best = 0;
    for window in longer.windows(window_len) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(shorter, &candidate));
        if best == 100 {
            break;
        }
    }
    best
}

/// Token-set similarity: split both sides into deduplicated word sets, then
/// compare the three reconstructed strings (shared tokens, shared +
/// left-only, shared + right-only) pairwise and keep the best. Word order
/// and repeated words stop mattering. 0–100.
pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    // BTreeSet iteration is sorted, so the reconstructed strings are
    // deterministic regardless of input order.
    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    let base = shared.join(" ");
    let left = append_tokens(&base, &only_a);
    let right = append_tokens(&base, &only_b);

    ratio(&base, &left)
        .max(ratio(&base, &right))
        .max(ratio(&left, &right))
}

fn append_tokens(base: &str, extra: &[&str]) -> String {
    if extra.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        extra.join(" ")
    } else {
        format!("{base} {}", extra.join(" "))
    }
}

/// The combined score: floored mean of partial-overlap and token-set.
/// Either side empty ⇒ 0, never an error.
pub fn combined_score(keyword: &str, text: &str) -> u32 {
    if keyword.is_empty() || text.is_empty() {
        return 0;
    }
    (partial_ratio(keyword, text) + token_set_ratio(keyword, text)) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(combined_score("refund", "refund"), 100);
    }

    #[test]
    fn keyword_inside_long_utterance() {
        let score = combined_score("refund", "i can process a refund for you");
        assert!(score >= MATCH_THRESHOLD, "got {score}");
    }

    #[test]
    fn reordered_phrase_clears_threshold() {
        // Token-set scores 100 (same vocabulary), partial overlap is
        // imperfect but the mean still clears the bar.
        let score = combined_score("cancel subscription", "cancel my subscription please");
        assert!(score >= MATCH_THRESHOLD, "got {score}");
    }

    #[test]
    fn unrelated_strings_stay_below_threshold() {
        let score = combined_score("refund", "what time do you close today");
        assert!(score < MATCH_THRESHOLD, "got {score}");
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(combined_score("", "anything"), 0);
        assert_eq!(combined_score("anything", ""), 0);
        assert_eq!(combined_score("", ""), 0);
    }

    #[test]
    fn partial_ratio_exact_substring_is_100() {
        assert_eq!(partial_ratio("billing", "talk about billing issue"), 100);
    }

    #[test]
    fn partial_ratio_is_symmetric_in_argument_order() {
        let a = "cancel subscription";
        let b = "cancel my subscription please";
        assert_eq!(partial_ratio(a, b), partial_ratio(b, a));
    }

    #[test]
    fn token_set_ignores_order_and_duplicates() {
        assert_eq!(token_set_ratio("late fee", "fee late"), 100);
        assert_eq!(token_set_ratio("late late fee", "late fee"), 100);
    }

    #[test]
    fn token_set_disjoint_vocabulary_scores_low() {
        let score = token_set_ratio("refund", "closing hours");
        assert!(score < 50, "got {score}");
    }

    #[test]
    fn scores_are_bounded() {
        for (a, b) in [
            ("a", "b"),
            ("abc", "abc"),
            ("x y z", "z y x"),
            ("keyword", "completely different text here"),
        ] {
            assert!(combined_score(a, b) <= 100);
            assert!(partial_ratio(a, b) <= 100);
            assert!(token_set_ratio(a, b) <= 100);
        }
    }
}
