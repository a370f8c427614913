// Report data model — the structured shapes flowing into and out of the
// matcher.
//
// These are separate from the matching logic so the storage and web layers
// can use them without touching the engine internals. JSON field names
// reproduce the established wire shape (`countBySpeaker`, per-role
// `{count, text: [...]}`) that downstream consumers already parse.

use serde::{Deserialize, Serialize};

use super::roles::SpeakerRole;

/// One speaker-attributed utterance from a diarized transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub speaker: String,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// A named keyword group. Keyword order is preserved; duplicates are
/// allowed and scored independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCategory {
    #[serde(rename = "category")]
    pub name: String,
    pub keywords: Vec<String>,
}

/// An ordered set of keyword categories. Category order is iteration
/// order and carries through to the report unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet {
    pub categories: Vec<KeywordCategory>,
}

impl KeywordSet {
    /// Group flat `(category, keyword)` entries into an ordered set.
    ///
    /// Categories appear in first-appearance order; blank categories and
    /// blank keywords (after trimming) are dropped silently, matching the
    /// lenient ingest behavior of the keyword-replace endpoint.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut set = KeywordSet::default();
        for (category, keyword) in entries {
            let category = category.into().trim().to_string();
            let keyword = keyword.into().trim().to_string();
            if category.is_empty() || keyword.is_empty() {
                continue;
            }
            set.push(&category, keyword);
        }
        set
    }

    /// Append a keyword to a category, creating the category at the end of
    /// the list if it doesn't exist yet.
    pub fn push(&mut self, category: &str, keyword: impl Into<String>) {
        let keyword = keyword.into();
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(existing) => existing.keywords.push(keyword),
            None => self.categories.push(KeywordCategory {
                name: category.to_string(),
                keywords: vec![keyword],
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }
}

/// One transcript segment recorded as supporting a keyword match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub text: String,
    pub speaker: String,
}

/// Match count and evidence for a single role.
/// Serialized as `{"count": n, "text": [...]}` — the historical field name
/// for the evidence list is `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTally {
    pub count: u32,
    #[serde(rename = "text")]
    pub evidence: Vec<MatchEvidence>,
}

/// Per-role tallies for one keyword. Only Agent and Customer are surfaced
/// here; Unknown-role matches are dropped in fuzzy mode (containment mode
/// surfaces them — see ContainmentRecord).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBySpeaker {
    #[serde(rename = "Agent")]
    pub agent: RoleTally,
    #[serde(rename = "Customer")]
    pub customer: RoleTally,
}

/// The match outcome for a single keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatchResult {
    pub keyword: String,
    #[serde(rename = "countBySpeaker")]
    pub count_by_speaker: CountBySpeaker,
}

impl KeywordMatchResult {
    /// Total matches across both surfaced roles.
    pub fn total_count(&self) -> u32 {
        self.count_by_speaker.agent.count + self.count_by_speaker.customer.count
    }
}

/// All keyword results for one category, in keyword input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMatchResult {
    pub category: String,
    pub keywords: Vec<KeywordMatchResult>,
}

/// The full fuzzy-mode report: categories in input order. Serializes as a
/// bare array; pass-through metadata (conversation id, project id, builder
/// name, raw segments) is attached by the report consumer, not the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchReport {
    pub categories: Vec<CategoryMatchResult>,
}

impl MatchReport {
    /// Total matches across every category, keyword, and surfaced role.
    pub fn total_matches(&self) -> u32 {
        self.categories
            .iter()
            .flat_map(|c| &c.keywords)
            .map(KeywordMatchResult::total_count)
            .sum()
    }
}

/// One containment-mode hit: a keyword literally present (spaces stripped)
/// in a segment. Unlike fuzzy mode, all three roles are surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentRecord {
    pub category: String,
    pub keyword: String,
    pub speaker: SpeakerRole,
    pub matched_text: String,
}
