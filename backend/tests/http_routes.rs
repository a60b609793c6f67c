#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ephemeris::db::{LocalStore, ReferenceStore};
use ephemeris::http::{create_router, AppState};
use ephemeris::{BodyId, Ephemeris};

use support::{fixture_engine, EPOCH, RANGE};

const KEY: &str = "s3cret";

fn app() -> (Arc<LocalStore>, Arc<Ephemeris>, Router) {
    let (store, engine) = fixture_engine();
    let engine = Arc::new(engine);
    let state = AppState::new(Arc::clone(&engine)).with_update_key(KEY);
    (store, engine, create_router(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn update(key: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/update-variables")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_reports_cache_sizes() {
    let (_, engine, app) = app();
    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["scrollEvents"], engine.scroll_cache().len());
    assert_eq!(body["lunarEvents"], 20);
}

#[tokio::test]
async fn test_update_requires_the_key() {
    let (store, _, app) = app();
    let payload = json!({"vars": {"red": [2, 1]}}).to_string();

    let (status, body) = send(app.clone(), update(None, &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let (status, _) = send(app, update(Some("guess"), &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(store.load_candidates().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_without_configured_key_is_refused() {
    let (_, engine) = fixture_engine();
    let app = create_router(AppState::new(Arc::new(engine)));
    let payload = json!({"vars": {"red": [2, 1]}}).to_string();
    let (status, _) = send(app, update(Some(""), &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_update_is_a_bad_payload() {
    let (store, _, app) = app();
    for payload in [
        r#"{"vars": {"red": [1.5, 2]}}"#,
        r#"{"vars": {"red": [1]}}"#,
        r#"{"vars": {"orange": [1, 2]}}"#,
        r#"{"vars": {"shadow": [1, 2]}}"#,
        r#"{"variables": {}}"#,
        "not json",
    ] {
        let (status, body) = send(app.clone(), update(Some(KEY), payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Bad Payload");
    }
    assert!(store.load_candidates().unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_update_stores_candidates() {
    let (store, _, app) = app();
    let payload = json!({"vars": {"red": [1_700_000_200_000_i64, 1_700_000_100_000_i64], "candle": [5, 4]}});
    let (status, body) = send(app, update(Some(KEY), &payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let pending = store.load_candidates().unwrap();
    assert_eq!(pending[&BodyId::Red], [1_700_000_200_000, 1_700_000_100_000]);
    assert_eq!(pending[&BodyId::White], [5, 4]);
}

#[tokio::test]
async fn test_scroll_events_in_range() {
    let (_, engine, app) = app();
    let horizon = engine.scroll_cache().horizon().unwrap();
    let end = RANGE.0 + (horizon - RANGE.0) / 2;

    let uri = format!("/v1/scroll-events?start={}&end={}", RANGE.0, end);
    let (status, body) = send(app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);

    let expected = engine.query_scroll_events(RANGE.0, end);
    assert_eq!(body["total"], expected.len());
    assert_eq!(body["events"][0]["timestamp"], RANGE.0);
    assert_eq!(body["fingerprint"], engine.scroll_cache().fingerprint());
}

#[tokio::test]
async fn test_scroll_events_filtered_by_body() {
    let (_, engine, app) = app();
    let horizon = engine.scroll_cache().horizon().unwrap();
    let uri = format!("/v1/scroll-events?start={}&end={}&bodies=red", RANGE.0, horizon - 1);
    let (status, body) = send(app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);

    let events = body["events"].as_array().unwrap();
    assert!(!events.is_empty());
    for event in events {
        let payload = &event["payload"];
        let mentions_red = ["newGlows", "newDarks", "returnedToNormal"]
            .iter()
            .any(|k| payload[k].as_array().unwrap().contains(&json!("Red")));
        assert!(mentions_red, "{event}");
    }
}

#[tokio::test]
async fn test_scroll_events_past_the_cache_conflict() {
    let (_, engine, app) = app();
    let horizon = engine.scroll_cache().horizon().unwrap();
    let uri = format!("/v1/scroll-events?start={}&end={}", RANGE.0, horizon);
    let (status, body) = send(app, get(&uri)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CACHE_EXHAUSTED");
    assert_eq!(body["horizon"], horizon);
}

#[tokio::test]
async fn test_scroll_events_reject_bad_queries() {
    let (_, _, app) = app();
    let uri = format!("/v1/scroll-events?start={}&end={}", RANGE.0 + 10, RANGE.0);
    let (status, _) = send(app.clone(), get(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/v1/scroll-events?start={}&end={}&bodies=orange", RANGE.0, RANGE.0 + 10);
    let (status, _) = send(app.clone(), get(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app, get("/v1/scroll-events?start=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lunar_events_honour_limit_and_phase_filter() {
    let (_, _, app) = app();
    let uri = format!("/v1/lunar-events?from={}&limit=3", EPOCH - 1);
    let (status, body) = send(app.clone(), get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);

    let uri = format!("/v1/lunar-events?from={}&phases=full,new", EPOCH - 1);
    let (status, body) = send(app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    for event in body["events"].as_array().unwrap() {
        let phase = event["payload"]["phase"].as_str().unwrap();
        assert!(phase == "full" || phase == "new", "{phase}");
    }
}

#[tokio::test]
async fn test_current_lunar_phase() {
    let (_, engine, app) = app();
    let lunar = engine.lunar_cache();
    let second = &lunar.events()[1];

    let uri = format!("/v1/lunar/current?at={}", second.timestamp);
    let (status, body) = send(app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], second.payload.phase.key());
    assert_eq!(body["at"], second.timestamp);
}
