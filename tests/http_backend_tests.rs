//! Integration Tests for the HTTP Backend
//!
//! Runs `HttpCache` against a small axum server that exposes an in-memory
//! cache over the REST contract.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tagbench::backend::{TAGS_HEADER, TTL_HEADER};
use tagbench::{commands, BenchError, Config, HttpCache, InitParams, MemoryCache, TaggedCache};
use tempfile::TempDir;

// == Stub Server ==

#[derive(Clone)]
struct StubState {
    cache: Arc<MemoryCache>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn save_handler(
    State(state): State<StubState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let tags: Vec<String> = header_str(&headers, TAGS_HEADER)
        .map(|v| {
            v.split(',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let ttl = header_str(&headers, TTL_HEADER)
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs);

    match state.cache.save(&body, &id, &tags, ttl).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn load_handler(
    State(state): State<StubState>,
    Path(id): Path<String>,
) -> Result<Vec<u8>, StatusCode> {
    match state.cache.load(&id).await {
        Ok(Some(payload)) => Ok(payload),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn clean_handler(State(state): State<StubState>, Path(tag): Path<String>) -> StatusCode {
    match state.cache.clean(&tag).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn ids_handler(State(state): State<StubState>) -> Json<Vec<String>> {
    Json(state.cache.list_ids().await.unwrap_or_default())
}

async fn tags_handler(State(state): State<StubState>) -> Json<Vec<String>> {
    Json(state.cache.list_tags().await.unwrap_or_default())
}

async fn matching_handler(
    State(state): State<StubState>,
    Json(tags): Json<Vec<String>>,
) -> Json<Vec<String>> {
    Json(state.cache.ids_matching_tags(&tags).await.unwrap_or_default())
}

async fn flush_handler(State(state): State<StubState>) -> StatusCode {
    match state.cache.flush_all().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn stub_router(cache: Arc<MemoryCache>) -> Router {
    Router::new()
        .route("/save/:id", put(save_handler))
        .route("/load/:id", get(load_handler))
        .route("/clean/:tag", post(clean_handler))
        .route("/ids", get(ids_handler))
        .route("/tags", get(tags_handler))
        .route("/ids-matching-tags", post(matching_handler))
        .route("/flush", post(flush_handler))
        .with_state(StubState { cache })
}

/// Serves `app` on an ephemeral port and returns its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn connect_stub() -> (HttpCache, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new(""));
    let url = serve(stub_router(Arc::clone(&cache))).await;
    let client = HttpCache::new(&url, Duration::from_secs(5)).unwrap();
    (client, cache)
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

// == Contract Tests ==

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let (http, backing) = connect_stub().await;

    http.save(b"payload", "id 1", &tags(&["TAG_1", "TAG_2"]), None)
        .await
        .unwrap();

    assert_eq!(http.load("id 1").await.unwrap(), Some(b"payload".to_vec()));
    assert_eq!(backing.list_ids().await.unwrap(), vec!["id 1"]);
}

#[tokio::test]
async fn test_load_miss_is_none() {
    let (http, _backing) = connect_stub().await;
    assert_eq!(http.load("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_listings_and_tag_queries() {
    let (http, _backing) = connect_stub().await;
    http.save(b"a", "a", &tags(&["TAG_1"]), None).await.unwrap();
    http.save(b"b", "b", &tags(&["TAG_1", "TAG_2"]), Some(Duration::from_secs(600)))
        .await
        .unwrap();

    assert_eq!(http.list_ids().await.unwrap(), vec!["a", "b"]);
    assert_eq!(
        http.list_tags().await.unwrap(),
        vec!["MAGE", "TAG_1", "TAG_2"]
    );
    assert_eq!(
        http.ids_matching_tags(&tags(&["TAG_1", "TAG_2"])).await.unwrap(),
        vec!["b"]
    );
}

#[tokio::test]
async fn test_clean_and_flush() {
    let (http, _backing) = connect_stub().await;
    http.save(b"a", "a", &tags(&["TAG_1"]), None).await.unwrap();
    http.save(b"b", "b", &tags(&["TAG_2"]), None).await.unwrap();

    http.clean("TAG_1").await.unwrap();
    assert_eq!(http.list_ids().await.unwrap(), vec!["b"]);

    http.flush_all().await.unwrap();
    assert!(http.list_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_status_is_backend_error() {
    let url = serve(Router::new()).await;
    let http = HttpCache::new(&url, Duration::from_secs(5)).unwrap();

    let err = http.flush_all().await.unwrap_err();
    match err {
        BenchError::Backend(message) => assert!(message.contains("404")),
        other => panic!("expected Backend error, got {:?}", other),
    }
}

// == Commands over HTTP ==

#[tokio::test]
async fn test_load_tags_and_ops_over_http() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        base_dir: tmp.path().to_path_buf(),
        ..Config::default()
    };
    let params = InitParams {
        name: "http".to_string(),
        num_keys: 50,
        num_tags: 8,
        num_clients: 1,
        num_ops: 40,
        seed: Some(7),
        ..InitParams::default()
    };
    commands::init(&config, &params, "tagbench init").unwrap();

    let (http, backing) = connect_stub().await;
    assert_eq!(commands::load(&config, &http, "http").await.unwrap(), 50);
    assert_eq!(backing.list_ids().await.unwrap().len(), 50);

    let summary = commands::tags(&config, &http, false).await.unwrap();
    assert!(summary.is_some());

    let result = commands::ops(&config, &http, "http", 0, false).await.unwrap();
    assert_eq!(result.total_ops(), 40);
}
