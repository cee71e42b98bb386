use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use boolquery_core::persist::{save_engine, IndexPaths};
use boolquery_core::{Corpus, EngineConfig, SearchEngine};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path, docs: &[&str]) {
    let corpus: Corpus = docs.iter().copied().collect();
    let engine = SearchEngine::build(corpus, EngineConfig::default());
    save_engine(&IndexPaths::new(dir), &engine).unwrap();
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    call(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn ids(json: &Value) -> Vec<u64> {
    json["results"].as_array().unwrap().iter().map(|h| h["doc_id"].as_u64().unwrap()).collect()
}

#[tokio::test]
async fn conjunctive_and_boolean_search() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &["the cat sat", "the dog ran", "cat and dog played"]);
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app.clone(), "/search?q=cat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![0, 2]);
    assert_eq!(json["results"][0]["snippet"], "the cat sat");

    let (status, json) = get(app.clone(), "/boolean?q=cat%20%26%20~dog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![0]);

    let (_, json) = get(app.clone(), "/boolean?q=cat%20%7C%20dog&k=2").await;
    assert_eq!(json["total_hits"], 3);
    assert_eq!(ids(&json), vec![0, 1]);
}

#[tokio::test]
async fn malformed_expression_is_bad_request() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &["the cat sat"]);
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app, "/boolean?q=cat%20%26").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("invalid query"));
}

#[tokio::test]
async fn doc_lookup() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &["the cat sat"]);
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app.clone(), "/doc/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "the cat sat");
    let (status, _) = get(app, "/doc/7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_requires_token_and_swaps_index() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &["the cat sat"]);
    let app = server::build_app_with_token(dir.path().to_string_lossy().to_string(), None).unwrap();

    let req = Request::post("/index/reload").body(Body::empty()).unwrap();
    let (status, _) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let engine = SearchEngine::build(["a bird sang", "the cat sat"].into_iter().collect(), EngineConfig::default());
    let state = server::AppState {
        index_root: dir.path().to_path_buf(),
        engine: std::sync::Arc::new(parking_lot::RwLock::new(std::sync::Arc::new(engine))),
        admin_token: Some("secret".into()),
    };
    let app = server::router(state);
    let (_, json) = get(app.clone(), "/search?q=bird").await;
    assert_eq!(ids(&json), vec![0]);

    let req = Request::post("/index/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 1);
    let (_, json) = get(app, "/search?q=bird").await;
    assert!(ids(&json).is_empty());
}

#[tokio::test]
async fn leading_not_adds_a_warning() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path(), &["the cat sat", "the dog ran"]);
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app.clone(), "/boolean?q=~cat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![0]);
    assert!(json["warning"].as_str().unwrap().contains("ignored"));

    let (_, json) = get(app, "/boolean?q=dog%20%26%20~cat").await;
    assert_eq!(ids(&json), vec![1]);
    assert!(json.get("warning").is_none());
}
