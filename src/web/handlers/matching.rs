// Match endpoints — the HTTP surface of the engine.
//
// GET /api/match         — fuzzy report with speaker attribution
// GET /api/match/export  — containment-mode records, one flat row per hit
//
// Both share the same validation chain as the original service, with the
// same error codes: ERR-1001 (conversation), ERR-1002 (project mismatch),
// ERR-1003 (builder mismatch), ERR-1004 (transcript), ERR-1005 (keywords),
// ERR-1007 (export failure).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::db::models::{Conversation, KeywordSetRecord, Project, StoredTranscript};
use crate::engine::{KeywordMatcher, MatcherConfig};
use crate::web::{api_error, error_envelope, AppState};

#[derive(Deserialize)]
pub struct MatchQuery {
    pub conversation_id: String,
    pub project_id: i64,
    pub builder_name: String,
    /// Optional fuzzy threshold override (0-100). Defaults to the
    /// deployment's configured threshold.
    pub threshold: Option<u32>,
}

struct MatchContext {
    conversation: Conversation,
    project: Project,
    transcript: StoredTranscript,
    keywords: KeywordSetRecord,
}

/// GET /api/match — fuzzy match keywords with speaker attribution.
pub async fn fetch_keywords_match(
    State(state): State<AppState>,
    Query(params): Query<MatchQuery>,
) -> Response {
    info!(
        conversation_id = %params.conversation_id,
        project_id = params.project_id,
        builder = %params.builder_name,
        "Matching keywords"
    );

    let ctx = match load_context(&state, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    if let Some(threshold) = params.threshold {
        if threshold > 100 {
            return api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "threshold must be between 0 and 100",
            );
        }
    }

    let matcher = KeywordMatcher::new(MatcherConfig {
        threshold: params.threshold.unwrap_or(state.config.threshold),
        role_map: state.config.role_map(),
    });
    let report = matcher.match_fuzzy(&ctx.transcript.segments, &ctx.keywords.keywords);

    Json(serde_json::json!({
        "status": "success",
        "agent_id": ctx.conversation.agent_id,
        "conversation_id": ctx.conversation.conversation_id,
        "project_id": ctx.project.id,
        "builder_name": ctx.project.builder_name,
        "matched_Keywords": report,
        "diarized_text": ctx.transcript.segments,
        "agent_speaker": state.config.agent_speaker,
        "customer_speaker": state.config.customer_speaker,
    }))
    .into_response()
}

/// GET /api/match/export — containment-mode records as flat rows, the JSON
/// feed for the spreadsheet export layer. All three speaker roles are
/// surfaced here, unlike the fuzzy report.
pub async fn export_containment(
    State(state): State<AppState>,
    Query(params): Query<MatchQuery>,
) -> Response {
    let ctx = match load_context(&state, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    let matcher = KeywordMatcher::new(MatcherConfig {
        threshold: state.config.threshold,
        role_map: state.config.role_map(),
    });
    let records = matcher.match_containment(&ctx.transcript.segments, &ctx.keywords.keywords);

    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "project_id": ctx.project.id,
                "conversation_id": ctx.conversation.conversation_id,
                "builder_name": ctx.project.builder_name,
                "category": r.category,
                "keyword": r.keyword,
                "speaker": r.speaker,
                "count": 1,
                "matched_text": r.matched_text,
            })
        })
        .collect();

    Json(serde_json::json!({
        "conversation_id": ctx.conversation.conversation_id,
        "project_id": ctx.project.id,
        "builder_name": ctx.project.builder_name,
        "record_count": rows.len(),
        "records": rows,
    }))
    .into_response()
}

/// The shared validation chain: conversation → project → transcript →
/// keywords, each failure mapped to its established error envelope.
async fn load_context(state: &AppState, params: &MatchQuery) -> Result<MatchContext, Response> {
    let builder_name = params.builder_name.trim();

    let conversation = match state.db.get_conversation(&params.conversation_id).await {
        Ok(Some(conversation)) => conversation,
        Ok(None) => {
            return Err(error_envelope(
                StatusCode::NOT_FOUND,
                "ERR-1001",
                "Conversation Id not Match",
                &[("Conversation Id", params.conversation_id.clone())],
            ));
        }
        Err(e) => return Err(internal(e, params)),
    };

    if conversation.project_id != params.project_id {
        return Err(error_envelope(
            StatusCode::NOT_FOUND,
            "ERR-1002",
            "The provided project ID doesn't correspond to this conversation.",
            &[
                ("Conversation Id", params.conversation_id.clone()),
                ("Project id", params.project_id.to_string()),
            ],
        ));
    }

    let project = match state
        .db
        .get_project_for_builder(params.project_id, builder_name)
        .await
    {
        Ok(Some(project)) => project,
        Ok(None) => {
            return Err(error_envelope(
                StatusCode::NOT_FOUND,
                "ERR-1003",
                "The provided project does not have an associated builder name",
                &[
                    ("Conversation Id", params.conversation_id.clone()),
                    ("Project id", params.project_id.to_string()),
                    ("Builder Name", params.builder_name.clone()),
                ],
            ));
        }
        Err(e) => return Err(internal(e, params)),
    };

    let transcript = match state.db.get_transcript(&params.conversation_id).await {
        Ok(Some(transcript))
            if !transcript.segments.is_empty() || !transcript.transcript_text.is_empty() =>
        {
            transcript
        }
        Ok(_) => {
            return Err(error_envelope(
                StatusCode::NOT_FOUND,
                "ERR-1004",
                "Transcription Not found for this conversation",
                &[
                    ("Conversation Id", params.conversation_id.clone()),
                    ("Project id", params.project_id.to_string()),
                    ("Builder Name", params.builder_name.clone()),
                ],
            ));
        }
        Err(e) => return Err(internal(e, params)),
    };

    let keywords = match state
        .db
        .get_keywords(params.project_id, builder_name)
        .await
    {
        Ok(Some(record)) if !record.keywords.is_empty() => record,
        Ok(_) => {
            return Err(error_envelope(
                StatusCode::NOT_FOUND,
                "ERR-1005",
                "Keyword not found for the given project and builder",
                &[
                    ("Project id", params.project_id.to_string()),
                    ("Builder Name", params.builder_name.clone()),
                ],
            ));
        }
        Err(e) => return Err(internal(e, params)),
    };

    Ok(MatchContext {
        conversation,
        project,
        transcript,
        keywords,
    })
}

fn internal(e: anyhow::Error, params: &MatchQuery) -> Response {
    tracing::error!(error = %e, conversation_id = %params.conversation_id, "Match request failed");
    error_envelope(
        StatusCode::NOT_FOUND,
        "ERR-1007",
        "Could not process the request for the given conversation",
        &[
            ("Conversation Id", params.conversation_id.clone()),
            ("Project id", params.project_id.to_string()),
            ("Builder Name", params.builder_name.clone()),
        ],
    )
}
