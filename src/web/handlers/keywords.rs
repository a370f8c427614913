// Keyword set handlers.
//
// GET  /api/keywords          — grouped keywords for a project + builder
// POST /api/keywords/replace  — replace the set from flat {category, keyword}
//                               entries; blanks skipped, order preserved
//
// Error envelopes reuse the established codes: ERR-1005 (keywords missing),
// ERR-1006 (project/builder mismatch).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::info;

use crate::engine::KeywordSet;
use crate::web::{api_error, error_envelope, AppState, AuthOwner};

#[derive(Deserialize)]
pub struct KeywordsQuery {
    pub project_id: i64,
    pub builder_name: String,
}

/// GET /api/keywords — keywords grouped by category.
pub async fn get_keywords(
    State(state): State<AppState>,
    Query(params): Query<KeywordsQuery>,
) -> Response {
    let builder_name = params.builder_name.trim();

    match state.db.get_keywords(params.project_id, builder_name).await {
        Ok(Some(record)) => Json(serde_json::json!({
            "project_id": params.project_id,
            "builder_name": params.builder_name,
            "keywords_by_category": record.keywords,
        }))
        .into_response(),
        Ok(None) => error_envelope(
            StatusCode::NOT_FOUND,
            "ERR-1005",
            "Keyword not found for this given project and builder",
            &[
                ("Project id", params.project_id.to_string()),
                ("Builder Name", params.builder_name.clone()),
            ],
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load keywords");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load keywords")
        }
    }
}

#[derive(Deserialize)]
pub struct KeywordItem {
    pub category: String,
    pub keyword: String,
}

#[derive(Deserialize)]
pub struct KeywordPayload {
    pub keywords: Vec<KeywordItem>,
}

/// POST /api/keywords/replace — replace the keyword set for a builder and
/// project. The flat entry list is grouped into categories in
/// first-appearance order; blank entries are dropped silently.
pub async fn replace_keywords(
    State(state): State<AppState>,
    Query(params): Query<KeywordsQuery>,
    Extension(AuthOwner(owner)): Extension<AuthOwner>,
    Json(payload): Json<KeywordPayload>,
) -> Response {
    let builder_name = params.builder_name.trim().to_string();

    // Validate the builder/project combo before touching the set
    let project = match state
        .db
        .get_project_for_builder(params.project_id, &builder_name)
        .await
    {
        Ok(Some(project)) => project,
        Ok(None) => {
            return error_envelope(
                StatusCode::NOT_FOUND,
                "ERR-1006",
                "Builder Name and Project Id do not match",
                &[
                    ("Project id", params.project_id.to_string()),
                    ("Builder Name", params.builder_name.clone()),
                ],
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to validate project");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to validate project");
        }
    };

    let set = KeywordSet::from_entries(
        payload
            .keywords
            .into_iter()
            .map(|item| (item.category, item.keyword)),
    );

    match state
        .db
        .replace_keywords(project.id, &builder_name, &set, Some(&owner))
        .await
    {
        Ok(replaced) => {
            info!(
                project_id = project.id,
                builder = %builder_name,
                replaced,
                categories = set.category_count(),
                keywords = set.keyword_count(),
                "Keyword set stored"
            );
            Json(serde_json::json!({
                "message": "Keywords successfully replaced.",
                "total_categories": set.category_count(),
                "total_keywords": set.keyword_count(),
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to replace keywords");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to replace keywords")
        }
    }
}
