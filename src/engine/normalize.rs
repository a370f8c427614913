// Text normalization — the canonical forms used before any comparison.
//
// Two variants exist because two call sites disagree about spaces: fuzzy
// scoring keeps internal spaces (token boundaries feed the token-set
// sub-score), while the containment check strips them entirely so that
// "credit card" is found inside "creditcard payment". Both fold case and
// drop every character that is not an ASCII letter, digit, or space.
// Internal space runs are NOT collapsed — only disallowed characters are
// removed, so "well...  okay" normalizes to "well  okay" with both spaces.

/// Canonical form for fuzzy scoring: case-folded, ASCII-alphanumeric plus
/// spaces, trimmed. Idempotent.
pub fn normalize_for_scoring(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Canonical form for literal containment checks: as above, with every
/// space removed as well.
pub fn normalize_for_containment(text: &str) -> String {
    normalize_for_scoring(text).replace(' ', "")
}
