// Web server — Axum-based JSON API around the matching engine.
//
// All routes under /api require a valid X-API-Key header; /health is open.
// Error responses for the match endpoints use the established envelope
// (`Error code` / `Error message` plus the identifiers the caller sent),
// which downstream consumers already parse.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;

pub mod auth;
pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub config: Arc<Config>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(
    config: Config,
    db: Arc<dyn Database>,
    port: u16,
    bind: &str,
) -> Result<()> {
    let state = AppState {
        db,
        config: Arc::new(config),
    };

    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Callscan API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the full router. Public so integration tests can drive it with
/// tower::ServiceExt::oneshot without binding a socket.
pub fn build_router(state: AppState) -> Router {
    // Authenticated API routes (require a valid X-API-Key header)
    let protected_api = Router::new()
        .route("/api/keywords", get(handlers::keywords::get_keywords))
        .route(
            "/api/keywords/replace",
            post(handlers::keywords::replace_keywords),
        )
        .route("/api/match", get(handlers::matching::fetch_keywords_match))
        .route(
            "/api/match/export",
            get(handlers::matching::export_containment),
        )
        .route(
            "/api/keys",
            post(handlers::keys::create_api_key).get(handlers::keys::list_api_keys),
        )
        .route(
            "/api/keys/{key_id}/activate",
            put(handlers::keys::activate_key),
        )
        .route(
            "/api/keys/{key_id}/deactivate",
            put(handlers::keys::deactivate_key),
        )
        .route("/api/status", get(handlers::status::get_status))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    // Public routes (no auth)
    let public_api = Router::new().route("/health", get(health));

    Router::new()
        .merge(protected_api)
        .merge(public_api)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, auth::api_key_header_name()]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// The established error envelope for the match/keyword endpoints:
/// `Error code`, `Error message`, plus the identifiers the caller supplied.
pub fn error_envelope(
    status: StatusCode,
    code: &str,
    message: &str,
    context: &[(&str, String)],
) -> Response {
    let mut body = serde_json::Map::new();
    body.insert("Error code".to_string(), code.into());
    body.insert("Error message".to_string(), message.into());
    for (key, value) in context {
        body.insert((*key).to_string(), value.clone().into());
    }
    (status, axum::Json(serde_json::Value::Object(body))).into_response()
}

/// The authenticated key's owner, inserted into request extensions by
/// `require_api_key` so handlers can audit who made a change.
#[derive(Clone)]
pub struct AuthOwner(pub String);
