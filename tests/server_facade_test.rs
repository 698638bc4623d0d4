//! HTTP façade tests.
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot` and
//! asserts status codes and JSON response shapes for every route, so a
//! regression in a handler, the status mapping or the CORS layer fails the
//! suite instead of passing unnoticed.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use sharesift::search::{DocRecord, SearchEngine};
use sharesift::server::router;

fn seeded_router(dir: &std::path::Path) -> Router {
    let engine = SearchEngine::open(dir).expect("open index");
    engine
        .upsert_batch(&[
            DocRecord {
                url: "file://fs01/share/finance/budget.xlsx".into(),
                title: "budget.xlsx".into(),
                content: "quarterly budget revenue forecast spreadsheet".into(),
                filetype: "excel".into(),
                ext: "xlsx".into(),
                timestamp: 1_700_000_000,
                server: "fs01".into(),
                share: "share".into(),
            },
            DocRecord {
                url: "file://fs01/share/hr/handbook.pdf".into(),
                title: "handbook.pdf".into(),
                content: "employee handbook vacation policy".into(),
                filetype: "pdf".into(),
                ext: "pdf".into(),
                timestamp: 1_700_000_100,
                server: "fs01".into(),
                share: "share".into(),
            },
        ])
        .expect("seed");
    router(Arc::new(engine))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    (status, body.to_vec())
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn healthz_reports_doc_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = seeded_router(dir.path());

    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    let value = json(&body);
    assert_eq!(value["status"], "ok");
    assert_eq!(value["num_docs"], 2);
    assert!(value["version"].is_string());
}

#[tokio::test]
async fn search_returns_ranked_hits_with_highlights() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = seeded_router(dir.path());

    let (status, body) = get(&app, "/search?q=budget").await;
    assert_eq!(status, StatusCode::OK);
    let value = json(&body);
    assert_eq!(value["total_count"], 1);
    assert_eq!(value["query"], "budget");
    let hit = &value["hits"][0];
    assert_eq!(hit["url"], "file://fs01/share/finance/budget.xlsx");
    assert_eq!(hit["filetype"], "excel");
    assert!(
        hit["excerpt"]
            .as_str()
            .expect("excerpt")
            .contains("<b>budget</b>")
    );
}

#[tokio::test]
async fn search_paginates_and_handles_empty_query() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = seeded_router(dir.path());

    // Blank query is a valid request with zero hits.
    let (status, body) = get(&app, "/search?q=%20").await;
    assert_eq!(status, StatusCode::OK);
    let value = json(&body);
    assert_eq!(value["total_count"], 0);
    assert_eq!(value["hits"].as_array().expect("hits").len(), 0);

    // Offset past the only hit yields an empty page with the right total.
    let (status, body) = get(&app, "/search?q=vacation&offset=5&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    let value = json(&body);
    assert_eq!(value["total_count"], 1);
    assert_eq!(value["hits"].as_array().expect("hits").len(), 0);
    assert_eq!(value["offset"], 5);
}

#[tokio::test]
async fn search_without_query_param_is_bad_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = seeded_router(dir.path());

    let (status, _) = get(&app, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suggest_completes_prefixes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = seeded_router(dir.path());

    let (status, body) = get(&app, "/suggest?q=bud").await;
    assert_eq!(status, StatusCode::OK);
    let value = json(&body);
    assert_eq!(value["query"], "bud");
    let suggestions: Vec<&str> = value["suggestions"]
        .as_array()
        .expect("suggestions")
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert!(
        suggestions.iter().any(|s| s.starts_with("budget")),
        "got: {suggestions:?}"
    );

    let (status, body) = get(&app, "/suggest?q=zzz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["suggestions"].as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn doc_lookup_by_url_and_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = seeded_router(dir.path());

    let (status, body) = get(&app, "/doc?url=file://fs01/share/hr/handbook.pdf").await;
    assert_eq!(status, StatusCode::OK);
    let value = json(&body);
    assert_eq!(value["title"], "handbook.pdf");
    assert_eq!(value["content"], "employee handbook vacation policy");
    assert_eq!(value["server"], "fs01");
    assert_eq!(value["timestamp"], 1_700_000_100);

    let (status, _) = get(&app, "/doc?url=file://fs01/share/missing.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_headers_are_present() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = seeded_router(dir.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header(header::ORIGIN, "http://audit.example")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "permissive CORS layer should answer cross-origin reads"
    );
}
