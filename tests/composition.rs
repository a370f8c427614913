// Composition tests — the full engine flow from transcript + keyword set
// to report, without any database or network involvement.
//
// These pin the externally observable behaviors: completeness, ordering,
// speaker attribution, evidence content, and the deliberate divergence
// between fuzzy and containment modes on Unknown speakers.

use callscan::engine::matcher::{KeywordMatcher, MatchMode, MatchOutcome, MatcherConfig};
use callscan::engine::report::{KeywordSet, TranscriptSegment};
use callscan::engine::roles::{RoleMap, SpeakerRole};

fn matcher() -> KeywordMatcher {
    KeywordMatcher::default()
}

// ============================================================
// Reference scenarios
// ============================================================

#[test]
fn agent_refund_is_counted_under_agent() {
    // Scenario: keyword "refund", agent says "I can process a refund for you"
    let segments = vec![TranscriptSegment::new(
        "Speaker_1",
        "I can process a refund for you",
    )];
    let set = KeywordSet::from_entries([("Billing", "refund")]);

    let report = matcher().match_fuzzy(&segments, &set);
    let result = &report.categories[0].keywords[0];

    assert_eq!(result.count_by_speaker.agent.count, 1);
    assert_eq!(result.count_by_speaker.customer.count, 0);

    let evidence = &result.count_by_speaker.agent.evidence[0];
    assert_eq!(evidence.text, "I can process a refund for you");
    assert_eq!(evidence.speaker, "Speaker_1");
}

#[test]
fn reordered_customer_phrase_is_counted_under_customer() {
    // Scenario: "cancel subscription" vs "cancel my subscription please" —
    // word order differs, the token-set sub-score carries the pair over 85
    let segments = vec![TranscriptSegment::new(
        "Speaker_0",
        "cancel my subscription please",
    )];
    let set = KeywordSet::from_entries([("Retention", "cancel subscription")]);

    let report = matcher().match_fuzzy(&segments, &set);
    let result = &report.categories[0].keywords[0];

    assert_eq!(result.count_by_speaker.customer.count, 1);
    assert_eq!(result.count_by_speaker.agent.count, 0);
}

#[test]
fn unknown_speaker_diverges_between_modes() {
    // Scenario: "billing" said by Speaker_2, which has no role map entry.
    // Fuzzy mode drops the match from both tallies; containment mode
    // surfaces it with an explicit Unknown attribution. This divergence is
    // intentional and this test is its canary — do not "fix" one side to
    // agree with the other without changing both consumers.
    let segments = vec![TranscriptSegment::new(
        "Speaker_2",
        "talk about billing issue",
    )];
    let set = KeywordSet::from_entries([("Billing", "billing")]);
    let m = matcher();

    let report = m.match_fuzzy(&segments, &set);
    let result = &report.categories[0].keywords[0];
    assert_eq!(result.total_count(), 0);
    assert!(result.count_by_speaker.agent.evidence.is_empty());
    assert!(result.count_by_speaker.customer.evidence.is_empty());

    let records = m.match_containment(&segments, &set);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].speaker, SpeakerRole::Unknown);
    assert_eq!(records[0].matched_text, "talk about billing issue");
}

#[test]
fn blank_keyword_is_skipped_entirely() {
    // Scenario: keyword "" (blank after trim) never reaches the output
    let segments = vec![TranscriptSegment::new("Speaker_0", "anything at all")];
    let mut set = KeywordSet::default();
    set.categories.push(callscan::engine::report::KeywordCategory {
        name: "Misc".to_string(),
        keywords: vec!["".to_string(), "   ".to_string(), "real".to_string()],
    });

    let report = matcher().match_fuzzy(&segments, &set);
    let keywords: Vec<&str> = report.categories[0]
        .keywords
        .iter()
        .map(|k| k.keyword.as_str())
        .collect();
    assert_eq!(keywords, vec!["real"]);
}

// ============================================================
// Completeness and ordering
// ============================================================

#[test]
fn every_keyword_appears_exactly_once_regardless_of_outcome() {
    let segments = vec![TranscriptSegment::new("Speaker_1", "refund please")];
    let set = KeywordSet::from_entries([
        ("Billing", "refund"),
        ("Billing", "invoice"),
        ("Support", "escalate"),
        ("Support", "supervisor"),
    ]);

    let report = matcher().match_fuzzy(&segments, &set);

    let mut seen = Vec::new();
    for category in &report.categories {
        for keyword in &category.keywords {
            seen.push((category.category.clone(), keyword.keyword.clone()));
        }
    }
    assert_eq!(
        seen,
        vec![
            ("Billing".to_string(), "refund".to_string()),
            ("Billing".to_string(), "invoice".to_string()),
            ("Support".to_string(), "escalate".to_string()),
            ("Support".to_string(), "supervisor".to_string()),
        ]
    );
}

#[test]
fn category_and_keyword_order_match_input_order() {
    // Deliberately non-alphabetical, non-sorted input — the report must
    // not resort anything
    let set = KeywordSet::from_entries([
        ("Zebra", "zzz"),
        ("Apple", "aaa"),
        ("Zebra", "aardvark"),
        ("Mango", "mmm"),
    ]);
    let report = matcher().match_fuzzy(&[], &set);

    let categories: Vec<&str> = report
        .categories
        .iter()
        .map(|c| c.category.as_str())
        .collect();
    assert_eq!(categories, vec!["Zebra", "Apple", "Mango"]);
    let zebra: Vec<&str> = report.categories[0]
        .keywords
        .iter()
        .map(|k| k.keyword.as_str())
        .collect();
    assert_eq!(zebra, vec!["zzz", "aardvark"]);
}

#[test]
fn duplicate_keywords_are_scored_independently() {
    let segments = vec![TranscriptSegment::new("Speaker_1", "refund refund refund")];
    let set = KeywordSet::from_entries([("Billing", "refund"), ("Billing", "refund")]);

    let report = matcher().match_fuzzy(&segments, &set);
    assert_eq!(report.categories[0].keywords.len(), 2);
    assert_eq!(
        report.categories[0].keywords[0], report.categories[0].keywords[1],
        "identical keywords produce identical results"
    );
}

#[test]
fn evidence_order_follows_segment_order() {
    let segments = vec![
        TranscriptSegment::new("Speaker_0", "first refund mention"),
        TranscriptSegment::new("Speaker_0", "second refund mention"),
        TranscriptSegment::new("Speaker_0", "third refund mention"),
    ];
    let set = KeywordSet::from_entries([("Billing", "refund")]);

    let report = matcher().match_fuzzy(&segments, &set);
    let evidence = &report.categories[0].keywords[0].count_by_speaker.customer.evidence;
    assert_eq!(evidence.len(), 3);
    assert_eq!(evidence[0].text, "first refund mention");
    assert_eq!(evidence[2].text, "third refund mention");
}

// ============================================================
// Empty-input safety
// ============================================================

#[test]
fn empty_transcript_produces_all_zero_report() {
    let set = KeywordSet::from_entries([("Billing", "refund"), ("Support", "escalate")]);
    let report = matcher().match_fuzzy(&[], &set);

    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.total_matches(), 0);
    for category in &report.categories {
        for keyword in &category.keywords {
            assert!(keyword.count_by_speaker.agent.evidence.is_empty());
            assert!(keyword.count_by_speaker.customer.evidence.is_empty());
        }
    }
}

#[test]
fn empty_keyword_set_produces_empty_report() {
    let segments = vec![TranscriptSegment::new("Speaker_0", "hello")];
    let report = matcher().match_fuzzy(&segments, &KeywordSet::default());
    assert!(report.categories.is_empty());

    let records = matcher().match_containment(&segments, &KeywordSet::default());
    assert!(records.is_empty());
}

#[test]
fn empty_segment_text_never_matches() {
    let segments = vec![
        TranscriptSegment::new("Speaker_1", ""),
        TranscriptSegment::new("Speaker_1", "???"),
    ];
    let set = KeywordSet::from_entries([("Billing", "refund")]);
    let report = matcher().match_fuzzy(&segments, &set);
    assert_eq!(report.total_matches(), 0);
}

// ============================================================
// Mode dispatch and report shape
// ============================================================

#[test]
fn run_dispatches_on_mode() {
    let segments = vec![TranscriptSegment::new("Speaker_1", "refund")];
    let set = KeywordSet::from_entries([("Billing", "refund")]);
    let m = matcher();

    match m.run(&segments, &set, MatchMode::Fuzzy) {
        MatchOutcome::Fuzzy(report) => assert_eq!(report.total_matches(), 1),
        MatchOutcome::Containment(_) => panic!("fuzzy mode returned containment records"),
    }
    match m.run(&segments, &set, MatchMode::Containment) {
        MatchOutcome::Containment(records) => assert_eq!(records.len(), 1),
        MatchOutcome::Fuzzy(_) => panic!("containment mode returned a fuzzy report"),
    }
}

#[test]
fn containment_requires_literal_presence() {
    // "cancel subscription" is NOT a literal substring of the reordered
    // sentence, so containment mode misses what fuzzy mode catches
    let segments = vec![TranscriptSegment::new(
        "Speaker_0",
        "cancel my subscription please",
    )];
    let set = KeywordSet::from_entries([("Retention", "cancel subscription")]);
    let m = matcher();

    assert_eq!(m.match_fuzzy(&segments, &set).total_matches(), 1);
    assert!(m.match_containment(&segments, &set).is_empty());
}

#[test]
fn containment_emits_one_record_per_matching_segment() {
    let segments = vec![
        TranscriptSegment::new("Speaker_1", "your refund is processed"),
        TranscriptSegment::new("Speaker_0", "thanks for the refund"),
    ];
    let set = KeywordSet::from_entries([("Billing", "refund")]);

    let records = matcher().match_containment(&segments, &set);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].speaker, SpeakerRole::Agent);
    assert_eq!(records[1].speaker, SpeakerRole::Customer);
}

#[test]
fn report_serializes_to_established_wire_shape() {
    let segments = vec![TranscriptSegment::new("Speaker_1", "refund time")];
    let set = KeywordSet::from_entries([("Billing", "refund")]);
    let report = matcher().match_fuzzy(&segments, &set);

    let json = serde_json::to_value(&report).unwrap();
    let keyword = &json[0]["keywords"][0];
    assert_eq!(keyword["keyword"], "refund");
    assert_eq!(keyword["countBySpeaker"]["Agent"]["count"], 1);
    assert!(keyword["countBySpeaker"]["Agent"]["text"].is_array());
    assert_eq!(keyword["countBySpeaker"]["Customer"]["count"], 0);
}

#[test]
fn custom_role_map_and_threshold_flow_through() {
    let m = KeywordMatcher::new(MatcherConfig {
        threshold: 60,
        role_map: RoleMap::two_party("agent_a", "caller_b"),
    });
    let segments = vec![TranscriptSegment::new("agent_a", "refunds available")];
    let set = KeywordSet::from_entries([("Billing", "refund")]);

    let report = m.match_fuzzy(&segments, &set);
    assert_eq!(report.categories[0].keywords[0].count_by_speaker.agent.count, 1);
}
