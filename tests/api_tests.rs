//! REST API Tests
//!
//! Drives the full router with `oneshot` requests: call lifecycle, error
//! mapping, statistics and the degraded speech endpoints.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use dutch_voice_gateway::{
    Persona, ServerConfig,
    core::session::TurnRole,
    core::speech::{STAND_IN_CONFIDENCE, STAND_IN_TRANSCRIPT},
    routes,
    state::AppState,
};

fn test_state() -> Arc<AppState> {
    AppState::new(ServerConfig {
        host: "127.0.0.1".to_string(),
        ..Default::default()
    })
}

fn app(state: &Arc<AppState>) -> Router {
    routes::build_router(state.clone())
}

async fn send(
    app: &Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn delete_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let state = test_state();
    let (status, body) = get_json(&app(&state), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "Dutch AI Voice Assistant");
}

#[tokio::test]
async fn test_call_lifecycle() {
    let state = test_state();
    let app = app(&state);

    let (status, created) = post_json(
        &app,
        "/calls",
        json!({"user_id": "u1", "voice_profile": "business"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "initiated");
    assert_eq!(created["voice_profile"], "business");
    let call_id = created["call_id"].as_str().unwrap().to_string();

    let (status, listed) = get_json(&app, "/calls").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["active_calls"], 1);
    assert_eq!(listed["calls"][0]["call_id"], call_id.as_str());
    assert_eq!(listed["calls"][0]["status"], "active");

    state
        .sessions
        .append_turn(&call_id, TurnRole::Assistant, "Goedemorgen", 1.0)
        .unwrap();
    state
        .sessions
        .append_turn(&call_id, TurnRole::User, "Mijn naam is Jan", 0.8)
        .unwrap();

    let (status, details) = get_json(&app, &format!("/calls/{call_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["user_id"], "u1");
    assert_eq!(details["transcript_turns"], 2);
    assert!(details["start_time"].as_str().unwrap().contains('T'));

    let (status, transcript) = get_json(&app, &format!("/calls/{call_id}/transcript")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        transcript["transcript"],
        json!(["assistant: Goedemorgen", "user: Mijn naam is Jan"])
    );

    let (status, summary) = delete_json(&app, &format!("/calls/{call_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["call_id"], call_id.as_str());
    assert_eq!(summary["status"], "completed");
    assert!(summary["duration"].as_f64().unwrap() >= 0.0);
    let mut keys: Vec<&str> = summary.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["call_id", "duration", "status"]);

    // Gone after ending
    let (status, body) = get_json(&app, &format!("/calls/{call_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Call not found");

    let (status, listed) = get_json(&app, "/calls").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["active_calls"], 0);
}

#[tokio::test]
async fn test_create_defaults_to_lifestyle() {
    let state = test_state();
    let (status, created) = post_json(&app(&state), "/calls", json!({"user_id": "u2"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["voice_profile"], "lifestyle");
}

#[tokio::test]
async fn test_create_validation_failures() {
    let state = test_state();
    let app = app(&state);

    let (status, body) = post_json(
        &app,
        "/calls",
        json!({"user_id": "u1", "voice_profile": "pirate"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("pirate"));

    let (status, _) = post_json(&app, "/calls", json!({"voice_profile": "business"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .method("POST")
        .uri("/calls")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // No state was touched
    assert_eq!(state.sessions.active_count(), 0);
}

#[tokio::test]
async fn test_unknown_call_is_not_found() {
    let state = test_state();
    let app = app(&state);

    for uri in ["/calls/missing", "/calls/missing/transcript"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["detail"], "Call not found");
    }

    let (status, _) = delete_json(&app, "/calls/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_end_twice_is_not_found() {
    let state = test_state();
    let app = app(&state);
    let call_id = state.sessions.create("u1", Persona::Lifestyle);

    let (status, _) = delete_json(&app, &format!("/calls/{call_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = delete_json(&app, &format!("/calls/{call_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats() {
    let state = test_state();
    let app = app(&state);

    let (status, empty) = get_json(&app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["total_calls"], 0);
    assert_eq!(empty["average_duration"], 0.0);

    let first = state.sessions.create("u1", Persona::Lifestyle);
    state.sessions.create("u2", Persona::Business);
    state.sessions.end(&first).unwrap();

    let (_, stats) = get_json(&app, "/stats").await;
    assert_eq!(stats["total_calls"], 2);
    assert_eq!(stats["active_calls"], 1);
    assert_eq!(stats["completed_calls"], 1);
    assert!(stats["total_conversation_minutes"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_speak_degrades_without_credentials() {
    let state = test_state();
    let request = Request::builder()
        .method("POST")
        .uri("/speak")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"text": "Goedemorgen", "voice_profile": "business"}).to_string(),
        ))
        .unwrap();

    let (status, headers, body) = send(&app(&state), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "audio/mpeg");
    assert_eq!(headers["x-speech-degraded"], "true");
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_speak_validation() {
    let state = test_state();
    let app = app(&state);

    let (status, _) = post_json(&app, "/speak", json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post_json(
        &app,
        "/speak",
        json!({"text": "Hallo", "voice_profile": "robot"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_transcribe_degrades_without_credentials() {
    let state = test_state();
    let request = Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header("content-type", "application/octet-stream")
        .body(Body::from(vec![0u8; 320]))
        .unwrap();

    let (status, _, body) = send(&app(&state), request).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["text"], STAND_IN_TRANSCRIPT);
    assert_eq!(body["degraded"], true);
    assert!((body["confidence"].as_f64().unwrap() - STAND_IN_CONFIDENCE as f64).abs() < 1e-6);
}
