// End-to-end integration tests for rollcall
//
// These tests drive the router directly against in-memory (and filesystem)
// storage and verify the persisted sheet contents.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Local;
use http_body_util::BodyExt;
use opendal::{services, Operator};
use rollcall::store::{Store, SHEET_HEADER};
use rollcall::{partition, router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

fn memory_app() -> (Router, Arc<Store>) {
    let op = Operator::new(services::Memory::default())
        .expect("Failed to create memory operator")
        .finish();
    let store = Arc::new(Store::new(op));
    let app = router(AppState {
        store: store.clone(),
    });
    (app, store)
}

async fn post_checkin(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from(body.to_string()))
                .expect("Failed to build request"),
        )
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).expect("Response body is not JSON");
    (status, json)
}

/// Assert a display timestamp is `Y/M/D h:m` with no zero padding.
fn assert_timestamp_format(ts: &str) {
    let (date, time) = ts.split_once(' ').expect("timestamp missing space");
    let date_parts: Vec<&str> = date.split('/').collect();
    let time_parts: Vec<&str> = time.split(':').collect();
    assert_eq!(date_parts.len(), 3, "expected Y/M/D in '{}'", ts);
    assert_eq!(time_parts.len(), 2, "expected h:m in '{}'", ts);

    for part in date_parts.into_iter().chain(time_parts) {
        let n: u32 = part.parse().expect("non-numeric timestamp component");
        // Unpadded: the component round-trips through its numeric value
        assert_eq!(part, n.to_string(), "zero-padded component in '{}'", ts);
    }
}

#[tokio::test]
async fn test_checkin_creates_sheet_with_header() {
    let (app, store) = memory_app();

    let key = partition::month_key(&Local::now());
    assert!(!store.sheet_exists(&key).await.unwrap());

    let (status, json) = post_checkin(app, "/v1/checkin", "name=Alice&status=in").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "success"}));

    assert!(store.sheet_exists(&key).await.unwrap());
    let rows = store.rows(&key).await.expect("sheet should exist");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], SHEET_HEADER);
    assert_eq!(rows[1][1], "Alice");
    assert_eq!(rows[1][2], "in");
    assert_timestamp_format(&rows[1][0]);
}

#[tokio::test]
async fn test_duplicate_checkins_append_identical_rows() {
    let (app, store) = memory_app();

    let (_, json) = post_checkin(app.clone(), "/v1/checkin", "name=Alice&status=in").await;
    assert_eq!(json["status"], "success");
    let (_, json) = post_checkin(app, "/v1/checkin", "name=Alice&status=in").await;
    assert_eq!(json["status"], "success");

    let key = partition::month_key(&Local::now());
    let rows = store.rows(&key).await.expect("sheet should exist");

    // Header plus two data rows - repeats are appended, not deduplicated
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][1..], rows[2][1..]);
}

#[tokio::test]
async fn test_existing_sheet_gets_exactly_one_row() {
    let (app, store) = memory_app();

    post_checkin(app.clone(), "/v1/checkin", "name=Alice&status=in").await;
    post_checkin(app, "/v1/checkin", "name=Bob&status=out").await;

    let key = partition::month_key(&Local::now());
    let rows = store.rows(&key).await.expect("sheet should exist");

    // Both requests landed in the same monthly sheet, header written once
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], SHEET_HEADER);
    assert_eq!(rows[2][1], "Bob");
    assert_eq!(rows[2][2], "out");
}

#[tokio::test]
async fn test_missing_fields_recorded_as_empty() {
    let (app, store) = memory_app();

    let (status, json) = post_checkin(app, "/v1/checkin", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");

    let key = partition::month_key(&Local::now());
    let rows = store.rows(&key).await.expect("sheet should exist");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "");
    assert_eq!(rows[1][2], "");
    assert_timestamp_format(&rows[1][0]);
}

#[tokio::test]
async fn test_query_params_merge_with_body() {
    let (app, store) = memory_app();

    // Query-only request
    let (_, json) = post_checkin(app.clone(), "/v1/checkin?name=Bob&status=out", "").await;
    assert_eq!(json["status"], "success");

    // Body overrides the query value for the same field
    let (_, json) = post_checkin(app, "/v1/checkin?name=Bob&status=out", "status=in").await;
    assert_eq!(json["status"], "success");

    let key = partition::month_key(&Local::now());
    let rows = store.rows(&key).await.expect("sheet should exist");
    assert_eq!(rows[1][1], "Bob");
    assert_eq!(rows[1][2], "out");
    assert_eq!(rows[2][1], "Bob");
    assert_eq!(rows[2][2], "in");
}

#[tokio::test]
async fn test_roundtrip_preserves_special_characters() {
    let (app, store) = memory_app();

    let (_, json) = post_checkin(
        app,
        "/v1/checkin",
        "name=O%27Neil%2C+Jr.+%22Bob%22&status=in",
    )
    .await;
    assert_eq!(json["status"], "success");

    let key = partition::month_key(&Local::now());
    let rows = store.rows(&key).await.expect("sheet should exist");
    let last = rows.last().expect("expected a data row");
    assert_eq!(last[1], "O'Neil, Jr. \"Bob\"");
    assert_eq!(last[2], "in");
}

#[tokio::test]
async fn test_unknown_params_are_ignored() {
    let (app, store) = memory_app();

    let (status, json) =
        post_checkin(app, "/v1/checkin", "name=Alice&status=in&badge=42&note=hi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");

    let key = partition::month_key(&Local::now());
    let rows = store.rows(&key).await.expect("sheet should exist");
    assert_eq!(rows[1].len(), 3);
    assert_eq!(rows[1][1], "Alice");
    assert_eq!(rows[1][2], "in");
}

#[tokio::test]
async fn test_append_failure_returns_error_and_adds_no_row() {
    // Filesystem backend with the current month's sheet shadowed by a
    // directory: the existence check passes, the read fails.
    let root = tempfile::tempdir().expect("Failed to create tempdir");
    let key = partition::month_key(&Local::now());
    std::fs::create_dir(root.path().join(format!("{}.csv", key)))
        .expect("Failed to create blocking directory");

    let op = Operator::new(services::Fs::default().root(&root.path().to_string_lossy()))
        .expect("Failed to create fs operator")
        .finish();
    let store = Arc::new(Store::new(op));
    let app = router(AppState {
        store: store.clone(),
    });

    let (status, json) = post_checkin(app, "/v1/checkin", "name=Alice&status=in").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));

    // Nothing was appended anywhere in the workbook directory
    let entries: Vec<_> = std::fs::read_dir(root.path().join(format!("{}.csv", key)))
        .expect("Failed to list blocking directory")
        .collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_health_and_ready() {
    let (app, _store) = memory_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ready");
}
