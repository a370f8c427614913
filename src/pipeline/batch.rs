// Batch matching pipeline: run the engine across every conversation of a
// project.
//
// Each invocation of the matcher is independent (own segments, shared
// read-only keyword set), so conversations can be scored concurrently.
// Results are reassembled in the original conversation order after the
// fan-out, not in completion order, so batch output is deterministic.

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::db::Database;
use crate::engine::{KeywordMatcher, KeywordSet, MatchReport};

/// The per-conversation outcome of a batch run.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub conversation_id: String,
    /// Keywords that matched at least once.
    pub matched_keywords: usize,
    /// Total matches across all keywords and both surfaced roles.
    pub total_matches: u32,
}

/// Run the fuzzy matcher over every conversation of a project.
///
/// Conversations with no stored transcript are skipped with a warning
/// rather than failing the batch. Returns results in conversation
/// insertion order.
pub async fn run(
    db: &Arc<dyn Database>,
    matcher: &KeywordMatcher,
    keywords: &KeywordSet,
    project_id: i64,
    concurrency: usize,
) -> Result<Vec<BatchResult>> {
    let conversation_ids = db.list_conversation_ids(project_id).await?;
    if conversation_ids.is_empty() {
        println!("No conversations found for project {project_id}.");
        return Ok(Vec::new());
    }

    info!(
        conversations = conversation_ids.len(),
        keywords = keywords.keyword_count(),
        "Starting batch match"
    );
    println!(
        "Matching {} keywords across {} conversations ({} concurrent)...",
        keywords.keyword_count(),
        conversation_ids.len(),
        concurrency,
    );

    let pb = ProgressBar::new(conversation_ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Matching [{bar:30}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    // Fan out with buffer_unordered, but carry each conversation's input
    // index so the results can be put back in input order afterwards.
    let mut indexed: Vec<(usize, Option<BatchResult>)> =
        stream::iter(conversation_ids.iter().enumerate().map(|(index, id)| {
            let pb = pb.clone();
            async move {
                let result = match_one(db, matcher, keywords, id).await;
                pb.inc(1);
                match result {
                    Ok(report) => (index, Some(summarize(id, &report))),
                    Err(e) => {
                        warn!(conversation_id = %id, error = %e, "Skipping conversation");
                        (index, None)
                    }
                }
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed
        .into_iter()
        .filter_map(|(_, result)| result)
        .collect())
}

async fn match_one(
    db: &Arc<dyn Database>,
    matcher: &KeywordMatcher,
    keywords: &KeywordSet,
    conversation_id: &str,
) -> Result<MatchReport> {
    let transcript = db
        .get_transcript(conversation_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no transcript stored for {conversation_id}"))?;

    Ok(matcher.match_fuzzy(&transcript.segments, keywords))
}

fn summarize(conversation_id: &str, report: &MatchReport) -> BatchResult {
    let matched_keywords = report
        .categories
        .iter()
        .flat_map(|c| &c.keywords)
        .filter(|k| k.total_count() > 0)
        .count();
    BatchResult {
        conversation_id: conversation_id.to_string(),
        matched_keywords,
        total_matches: report.total_matches(),
    }
}
