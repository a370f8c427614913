// The fuzzy keyword-matching engine.
//
// Pure, synchronous computation: normalize text, score keyword/segment
// pairs, aggregate matches into a per-category report with speaker
// attribution. No I/O, no shared state between invocations — callers can
// run as many matches in parallel as they like.

pub mod matcher;
pub mod normalize;
pub mod report;
pub mod roles;
pub mod similarity;

pub use matcher::{KeywordMatcher, MatchMode, MatchOutcome, MatcherConfig};
pub use report::{KeywordSet, MatchReport, TranscriptSegment};
pub use roles::{RoleMap, SpeakerRole};
pub use similarity::MATCH_THRESHOLD;
