// The match aggregator — drives normalization and scoring across the
// (category → keyword) × segment cross product.
//
// One loop, two strategies. Fuzzy mode scores every keyword/segment pair
// and tallies hits at or above the threshold under Agent/Customer (Unknown
// is dropped from the tallies). Containment mode checks for the keyword as
// a literal substring after space-stripped normalization and emits one
// record per hit with all three roles surfaced. The two modes genuinely
// diverge on Unknown speakers; that divergence is load-bearing for
// downstream consumers and is pinned by tests rather than reconciled.
//
// Complexity is O(keywords × segments × scoring cost). Repeated identical
// keywords are rescored independently — keyword counts are small (tens)
// against segment counts (hundreds), so memoization isn't worth the
// bookkeeping yet.

use super::normalize::{normalize_for_containment, normalize_for_scoring};
use super::report::{
    CategoryMatchResult, ContainmentRecord, CountBySpeaker, KeywordMatchResult, KeywordSet,
    MatchEvidence, MatchReport, TranscriptSegment,
};
use super::roles::{RoleMap, SpeakerRole};
use super::similarity::{combined_score, MATCH_THRESHOLD};

/// Which matching strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Combined fuzzy score ≥ threshold; Agent/Customer tallies with evidence.
    Fuzzy,
    /// Space-stripped literal substring; one record per hit, all roles.
    Containment,
}

/// Matcher configuration: the score threshold and the speaker role map.
/// Defaults reproduce the historical behavior (threshold 85, two-label map).
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub threshold: u32,
    pub role_map: RoleMap,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
            role_map: RoleMap::default(),
        }
    }
}

/// The result of one matcher run, shaped by the mode it ran in.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Fuzzy(MatchReport),
    Containment(Vec<ContainmentRecord>),
}

/// The engine entry point. Stateless across runs; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    config: MatcherConfig,
}

impl KeywordMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn threshold(&self) -> u32 {
        self.config.threshold
    }

    /// Run the aggregation loop in the given mode.
    ///
    /// Every non-blank keyword appears exactly once in fuzzy output, in its
    /// input category and position, even with zero matches. Blank keywords
    /// and blank category names are skipped silently. Zero segments or an
    /// empty keyword set are not errors.
    pub fn run(
        &self,
        segments: &[TranscriptSegment],
        keywords: &KeywordSet,
        mode: MatchMode,
    ) -> MatchOutcome {
        // Normalize each segment once up front; keywords are normalized
        // once each inside the loop.
        let normalized: Vec<String> = segments
            .iter()
            .map(|s| match mode {
                MatchMode::Fuzzy => normalize_for_scoring(&s.text),
                MatchMode::Containment => normalize_for_containment(&s.text),
            })
            .collect();

        let mut categories = Vec::new();
        let mut records = Vec::new();

        for category in &keywords.categories {
            if category.name.trim().is_empty() {
                continue;
            }

            let mut keyword_results = Vec::new();
            for keyword in &category.keywords {
                if keyword.trim().is_empty() {
                    continue;
                }

                match mode {
                    MatchMode::Fuzzy => {
                        let keyword_norm = normalize_for_scoring(keyword);
                        keyword_results.push(self.match_one_fuzzy(
                            keyword,
                            &keyword_norm,
                            segments,
                            &normalized,
                        ));
                    }
                    MatchMode::Containment => {
                        let keyword_norm = normalize_for_containment(keyword);
                        // A keyword that normalizes to nothing is contained
                        // in everything; treat it as unmatched instead.
                        if keyword_norm.is_empty() {
                            continue;
                        }
                        for (segment, text_norm) in segments.iter().zip(&normalized) {
                            if text_norm.contains(&keyword_norm) {
                                records.push(ContainmentRecord {
                                    category: category.name.clone(),
                                    keyword: keyword.clone(),
                                    speaker: self.config.role_map.resolve(&segment.speaker),
                                    matched_text: segment.text.clone(),
                                });
                            }
                        }
                    }
                }
            }

            if mode == MatchMode::Fuzzy {
                categories.push(CategoryMatchResult {
                    category: category.name.clone(),
                    keywords: keyword_results,
                });
            }
        }

        match mode {
            MatchMode::Fuzzy => MatchOutcome::Fuzzy(MatchReport { categories }),
            MatchMode::Containment => MatchOutcome::Containment(records),
        }
    }

    /// Fuzzy-mode convenience wrapper.
    pub fn match_fuzzy(&self, segments: &[TranscriptSegment], keywords: &KeywordSet) -> MatchReport {
        match self.run(segments, keywords, MatchMode::Fuzzy) {
            MatchOutcome::Fuzzy(report) => report,
            MatchOutcome::Containment(_) => unreachable!("fuzzy run returned containment records"),
        }
    }

    /// Containment-mode convenience wrapper.
    pub fn match_containment(
        &self,
        segments: &[TranscriptSegment],
        keywords: &KeywordSet,
    ) -> Vec<ContainmentRecord> {
        match self.run(segments, keywords, MatchMode::Containment) {
            MatchOutcome::Containment(records) => records,
            MatchOutcome::Fuzzy(_) => unreachable!("containment run returned a fuzzy report"),
        }
    }

    fn match_one_fuzzy(
        &self,
        keyword: &str,
        keyword_norm: &str,
        segments: &[TranscriptSegment],
        normalized: &[String],
    ) -> KeywordMatchResult {
        let mut tallies = CountBySpeaker::default();

        for (segment, text_norm) in segments.iter().zip(normalized) {
            let score = combined_score(keyword_norm, text_norm);
            if score < self.config.threshold {
                continue;
            }

            let evidence = MatchEvidence {
                text: segment.text.clone(),
                speaker: segment.speaker.clone(),
            };
            match self.config.role_map.resolve(&segment.speaker) {
                SpeakerRole::Agent => {
                    tallies.agent.count += 1;
                    tallies.agent.evidence.push(evidence);
                }
                SpeakerRole::Customer => {
                    tallies.customer.count += 1;
                    tallies.customer.evidence.push(evidence);
                }
                // Unknown speakers contribute to neither tally in this mode.
                SpeakerRole::Unknown => {}
            }
        }

        KeywordMatchResult {
            keyword: keyword.to_string(),
            count_by_speaker: tallies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("Speaker_1", "I can process a refund for you"),
            TranscriptSegment::new("Speaker_0", "cancel my subscription please"),
            TranscriptSegment::new("Speaker_2", "talk about billing issue"),
        ]
    }

    fn keyword_set() -> KeywordSet {
        KeywordSet::from_entries([
            ("Billing", "refund"),
            ("Billing", "billing"),
            ("Retention", "cancel subscription"),
        ])
    }

    #[test]
    fn fuzzy_attributes_by_role() {
        let matcher = KeywordMatcher::default();
        let report = matcher.match_fuzzy(&segments(), &keyword_set());

        let refund = &report.categories[0].keywords[0];
        assert_eq!(refund.keyword, "refund");
        assert_eq!(refund.count_by_speaker.agent.count, 1);
        assert_eq!(refund.count_by_speaker.customer.count, 0);
        assert_eq!(
            refund.count_by_speaker.agent.evidence[0].text,
            "I can process a refund for you"
        );

        let cancel = &report.categories[1].keywords[0];
        assert_eq!(cancel.count_by_speaker.customer.count, 1);
        assert_eq!(cancel.count_by_speaker.agent.count, 0);
    }

    #[test]
    fn fuzzy_drops_unknown_speakers() {
        let matcher = KeywordMatcher::default();
        let report = matcher.match_fuzzy(&segments(), &keyword_set());

        // "billing" matches the Speaker_2 segment, but Speaker_2 has no
        // role map entry, so neither tally moves.
        let billing = &report.categories[0].keywords[1];
        assert_eq!(billing.keyword, "billing");
        assert_eq!(billing.total_count(), 0);
        assert!(billing.count_by_speaker.agent.evidence.is_empty());
    }

    #[test]
    fn containment_surfaces_unknown_speakers() {
        let matcher = KeywordMatcher::default();
        let records = matcher.match_containment(&segments(), &keyword_set());

        let billing: Vec<_> = records.iter().filter(|r| r.keyword == "billing").collect();
        assert_eq!(billing.len(), 1);
        assert_eq!(billing[0].speaker, SpeakerRole::Unknown);
        assert_eq!(billing[0].matched_text, "talk about billing issue");
    }

    #[test]
    fn containment_ignores_spaces() {
        let matcher = KeywordMatcher::default();
        let segs = vec![TranscriptSegment::new("Speaker_0", "my creditcard was charged")];
        let set = KeywordSet::from_entries([("Billing", "credit card")]);
        let records = matcher.match_containment(&segs, &set);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].speaker, SpeakerRole::Customer);
    }

    #[test]
    fn custom_threshold_is_honored() {
        // "billing" against "bill payment overdue" scores well below the
        // default bar but above a lenient one.
        let segs = vec![TranscriptSegment::new("Speaker_1", "bill payment overdue")];
        let set = KeywordSet::from_entries([("Billing", "billing")]);

        let strict = KeywordMatcher::default();
        assert_eq!(strict.match_fuzzy(&segs, &set).total_matches(), 0);

        let lenient = KeywordMatcher::new(MatcherConfig {
            threshold: 10,
            role_map: RoleMap::default(),
        });
        assert_eq!(lenient.match_fuzzy(&segs, &set).total_matches(), 1);
    }

    #[test]
    fn empty_transcript_yields_zero_counts_not_errors() {
        let matcher = KeywordMatcher::default();
        let report = matcher.match_fuzzy(&[], &keyword_set());
        assert_eq!(report.categories.len(), 2);
        for category in &report.categories {
            for kw in &category.keywords {
                assert_eq!(kw.total_count(), 0);
                assert!(kw.count_by_speaker.agent.evidence.is_empty());
                assert!(kw.count_by_speaker.customer.evidence.is_empty());
            }
        }
    }

    #[test]
    fn empty_keyword_set_yields_empty_report() {
        let matcher = KeywordMatcher::default();
        let report = matcher.match_fuzzy(&segments(), &KeywordSet::default());
        assert!(report.categories.is_empty());
    }

    #[test]
    fn symbols_only_keyword_does_not_match_everything_in_containment() {
        // "!!!" normalizes to the empty string; the empty string is a
        // substring of everything, which would explode the record list.
        let matcher = KeywordMatcher::default();
        let mut set = KeywordSet::default();
        set.push("Noise", "!!!");
        let records = matcher.match_containment(&segments(), &set);
        assert!(records.is_empty());
    }

    #[test]
    fn segment_matches_multiple_keywords_independently() {
        let matcher = KeywordMatcher::default();
        let segs = vec![TranscriptSegment::new("Speaker_1", "refund the late fee")];
        let set = KeywordSet::from_entries([("Billing", "refund"), ("Billing", "late fee")]);
        let report = matcher.match_fuzzy(&segs, &set);
        assert_eq!(report.categories[0].keywords[0].total_count(), 1);
        assert_eq!(report.categories[0].keywords[1].total_count(), 1);
    }
}
