use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use boolquery_core::persist::{load_engine, IndexPaths};
use boolquery_core::{DocId, Error as CoreError, SearchEngine};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

const LEADING_NOT_WARNING: &str = "'~' on the first operand is ignored; write `x & ~y` to exclude y";

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub snippet: String,
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub num_docs: usize,
    pub num_terms: usize,
}

/// The engine is swapped whole on reload; queries clone the inner `Arc` and
/// never hold the lock while evaluating.
#[derive(Clone)]
pub struct AppState {
    pub index_root: PathBuf,
    pub engine: Arc<RwLock<Arc<SearchEngine>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    fn engine(&self) -> Arc<SearchEngine> {
        Arc::clone(&self.engine.read())
    }
}

pub enum ApiError {
    BadQuery(String),
    NotFound,
    Unauthorized(&'static str),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadQuery(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.to_string()),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
        };
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match &e {
            CoreError::InvalidQuery(_) => ApiError::BadQuery(e.to_string()),
            _ => ApiError::Unavailable(e.to_string()),
        }
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    build_app_with_token(index_dir, std::env::var("ADMIN_TOKEN").ok())
}

pub fn build_app_with_token(index_dir: String, admin_token: Option<String>) -> Result<Router> {
    let engine = load_engine(&IndexPaths::new(&index_dir))?;
    tracing::info!(num_docs = engine.corpus().len(), num_terms = engine.index().len(), "index loaded");
    let state = AppState {
        index_root: PathBuf::from(&index_dir),
        engine: Arc::new(RwLock::new(Arc::new(engine))),
        admin_token,
    };
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let engine = state.engine();
    let ids = engine.conjunctive_query(&params.q);
    Json(respond(&engine, params, ids, start))
}

pub async fn boolean_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let engine = state.engine();
    let ids = engine.boolean_query(&params.q)?;
    let leading_not = engine.leading_not_ignored(&params.q);
    let mut resp = respond(&engine, params, ids, start);
    if leading_not {
        resp.warning = Some(LEADING_NOT_WARNING.to_string());
    }
    Ok(Json(resp))
}

/// Results are in ascending id order; `k` only truncates.
fn respond(engine: &SearchEngine, params: SearchParams, ids: Vec<DocId>, start: std::time::Instant) -> SearchResponse {
    let k = params.k.clamp(1, 100);
    let total_hits = ids.len();
    let results = ids
        .into_iter()
        .take(k)
        .filter_map(|doc_id| engine.corpus().get(doc_id).map(|text| SearchHit { doc_id, snippet: snippet(text) }))
        .collect();
    SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), total_hits, results, warning: None }
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine();
    let text = engine.corpus().get(doc_id).ok_or(ApiError::NotFound)?;
    Ok(Json(serde_json::json!({ "doc_id": doc_id, "text": text })))
}

/// Reloads the snapshot from disk, e.g. after `indexer build --overwrite`.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<ReloadResponse>, ApiError> {
    authorize(&state, &headers)?;
    let root = state.index_root.clone();
    let engine = tokio::task::spawn_blocking(move || load_engine(&IndexPaths::new(root)))
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))??;
    let resp = ReloadResponse { num_docs: engine.corpus().len(), num_terms: engine.index().len() };
    *state.engine.write() = Arc::new(engine);
    tracing::info!(num_docs = resp.num_docs, num_terms = resp.num_terms, "index reloaded");
    Ok(Json(resp))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = state.admin_token.as_ref().ok_or(ApiError::Unauthorized("ADMIN_TOKEN not set"))?;
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token"))
    }
}
