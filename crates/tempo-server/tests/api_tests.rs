//! Integration tests for the Tempo API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` over the
//! in-memory store, offline planner and disabled avatar, so no network
//! services are needed.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use futures::StreamExt;
use serde_json::{json, Value};
use tempo_planner::Planner;
use tempo_server::avatar::AvatarClient;
use tempo_server::build_router;
use tempo_server::config::AvatarConfig;
use tempo_server::AppState;
use tempo_store::{user_channel, KvBackend, MemoryKv};
use tempo_types::UserId;
use tower::ServiceExt;

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

/// Onboard `user_id` and return its session token.
async fn onboard(router: &Router, user_id: &str) -> String {
    let (status, body) = send(
        router,
        request(
            "POST",
            "/api/onboarding",
            None,
            Some(json!({
                "user_id": user_id,
                "display_name": "Alice",
                "wake_rhythm": "early_bird",
                "non_negotiables": ["exercise", " "],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_owned()
}

fn setup() -> (Arc<AppState>, Router) {
    let state = AppState::in_memory();
    let router = build_router(Arc::clone(&state));
    (state, router)
}

/// State over a store the test can inspect, with a short stream keep-alive.
fn setup_with_memory(keepalive: Duration) -> (MemoryKv, Router) {
    let memory = MemoryKv::new();
    let state = Arc::new(AppState::new(
        &KvBackend::Memory(memory.clone()),
        Planner::offline(),
        AvatarClient::new(AvatarConfig::default()),
        keepalive,
    ));
    (memory, build_router(state))
}

async fn next_frame<S>(frames: &mut S) -> String
where
    S: futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let frame = tokio::time::timeout(Duration::from_secs(1), frames.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    String::from_utf8(frame.to_vec()).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_health() {
    let (_, router) = setup();
    let (status, body) = send(&router, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["planner"], "offline");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (_, router) = setup();
    for uri in ["/api/schedule", "/api/profile"] {
        let (status, body) = send(&router, request("GET", uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "not authenticated");
    }
    let (status, _) = send(&router, request("GET", "/api/schedule", Some("bogus"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_onboarding_and_profile() {
    let (_, router) = setup();
    let token = onboard(&router, "alice").await;

    let (status, profile) = send(&router, request("GET", "/api/profile", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], "alice");
    assert_eq!(profile["wake_rhythm"], "early_bird");
    assert_eq!(profile["non_negotiables"], json!(["exercise"]));

    let (status, updated) = send(
        &router,
        request("PATCH", "/api/profile", Some(&token), Some(json!({"wake_rhythm": "night_owl"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["wake_rhythm"], "night_owl");
    assert_eq!(updated["display_name"], "Alice");

    let (status, _) = send(
        &router,
        request("PATCH", "/api/profile", Some(&token), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_onboarding_existing_user_rejected() {
    let (_, router) = setup();
    onboard(&router, "alice").await;
    let (status, body) = send(
        &router,
        request(
            "POST",
            "/api/onboarding",
            None,
            Some(json!({"user_id": "alice", "display_name": "Alice again"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_add_events_sorted_by_start() {
    let (_, router) = setup();
    let token = onboard(&router, "alice").await;

    for (title, start, end) in [("Lunch", "12:00", "13:00"), ("Standup", "09:00", "09:30")] {
        let (status, event) = send(
            &router,
            request(
                "POST",
                "/api/schedule/events",
                Some(&token),
                Some(json!({"title": title, "start": start, "end": end, "date": "2026-03-02"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(event["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    let (status, day) = send(
        &router,
        request("GET", "/api/schedule?date=2026-03-02", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = day["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Standup", "Lunch"]);
}

#[tokio::test]
async fn test_invalid_event_rejected() {
    let (_, router) = setup();
    let token = onboard(&router, "alice").await;
    let (status, _) = send(
        &router,
        request(
            "POST",
            "/api/schedule/events",
            Some(&token),
            Some(json!({"title": "Gym", "start": "25:00", "date": "2026-03-02"})),
        ),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_add_rejects_duplicate_id_and_drops_inverted_end() {
    let (state, router) = setup();
    let token = onboard(&router, "alice").await;
    let mut statuses = Vec::new();
    for (id, title, start, end) in [
        ("x", "A", "09:00", None),
        ("x", "B", "10:00", None),
        ("y", "Inverted", "15:00", Some("08:00")),
    ] {
        let (status, _) = send(
            &router,
            request(
                "POST",
                "/api/schedule/events",
                Some(&token),
                Some(json!({"id": id, "title": title, "start": start, "end": end, "date": "2026-03-02"})),
            ),
        )
        .await;
        statuses.push(status);
    }
    assert_eq!(
        statuses,
        vec![StatusCode::CREATED, StatusCode::BAD_REQUEST, StatusCode::CREATED]
    );

    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let stored: Vec<(String, String, Option<String>)> = state
        .events
        .read(&UserId::from("alice"), date)
        .await
        .unwrap()
        .into_iter()
        .map(|e| (e.id.to_string(), e.title, e.end.map(|t| t.to_string())))
        .collect();
    assert_eq!(
        stored,
        vec![
            ("x".to_owned(), "A".to_owned(), None),
            ("y".to_owned(), "Inverted".to_owned(), None),
        ]
    );
}

#[tokio::test]
async fn test_remove_event_and_absent_id() {
    let (_, router) = setup();
    let token = onboard(&router, "alice").await;
    let (_, event) = send(
        &router,
        request(
            "POST",
            "/api/schedule/events",
            Some(&token),
            Some(json!({"id": "lunch-1", "title": "Lunch", "start": "12:00", "date": "2026-03-02"})),
        ),
    )
    .await;
    assert_eq!(event["id"], "lunch-1");

    let (status, body) = send(
        &router,
        request("DELETE", "/api/schedule/events/2026-03-02/missing", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);
    assert!(body["message"].as_str().unwrap().contains("not found"));

    let (_, body) = send(
        &router,
        request("DELETE", "/api/schedule/events/2026-03-02/lunch-1", Some(&token), None),
    )
    .await;
    assert_eq!(body["removed"], true);
    assert_eq!(body["event"]["title"], "Lunch");
}

#[tokio::test]
async fn test_generate_offline_uses_default_schedule() {
    let (_, router) = setup();
    let token = onboard(&router, "alice").await;
    let (status, body) = send(
        &router,
        request(
            "POST",
            "/api/schedule/generate",
            Some(&token),
            Some(json!({"date": "2026-03-02", "horizon": "week"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert!(days.iter().all(|d| d["source"] == "fallback"));

    let (_, day) = send(
        &router,
        request("GET", "/api/schedule?date=2026-03-05", Some(&token), None),
    )
    .await;
    let events = day["events"].as_array().unwrap();
    assert!(events.iter().any(|e| e["title"] == "Exercise"));
    assert!(events.iter().all(|e| e["date"] == "2026-03-05"));
}

#[tokio::test]
async fn test_command_offline_is_noop() {
    let (_, router) = setup();
    let token = onboard(&router, "alice").await;
    let (status, body) = send(
        &router,
        request(
            "POST",
            "/api/schedule/command",
            Some(&token),
            Some(json!({"instruction": "add gym at six", "date": "2026-03-02"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"]["action"], "none");
    assert!(body["result"].as_str().unwrap().starts_with("No changes made"));
}

#[tokio::test]
async fn test_avatar_unavailable_without_key() {
    let (_, router) = setup();
    let token = onboard(&router, "alice").await;
    let (status, body) = send(
        &router,
        request("POST", "/api/avatar/conversations", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_tool_call_unknown_conversation_edits_demo_calendar() {
    let (state, router) = setup();
    let (status, body) = send(
        &router,
        request(
            "POST",
            "/api/avatar/tool-call",
            None,
            Some(json!({
                "conversation_id": "unknown",
                "tool_name": "add_event",
                "arguments": {"title": "Walk", "start": "18:00", "date": "2026-03-02"},
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Added Walk at 18:00 on 2026-03-02.");

    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let events = state.events.read(&UserId::demo(), date).await.unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_stream_delivers_own_notifications() {
    let (_, router) = setup();
    let alice = onboard(&router, "alice").await;
    let bob = onboard(&router, "bob").await;

    let response = router
        .clone()
        .oneshot(request("GET", &format!("/api/schedule/stream?token={alice}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut frames = response.into_body().into_data_stream();

    let first = tokio::time::timeout(Duration::from_secs(1), frames.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let first = String::from_utf8(first.to_vec()).unwrap();
    assert!(first.contains("event: connected"));
    assert!(first.contains("alice"));

    // Bob's edit must not reach Alice's stream; Alice's must.
    for (token, title) in [(&bob, "Bob lunch"), (&alice, "Alice lunch")] {
        send(
            &router,
            request(
                "POST",
                "/api/schedule/events",
                Some(token),
                Some(json!({"title": title, "start": "12:00", "date": "2026-03-02"})),
            ),
        )
        .await;
    }

    let next = tokio::time::timeout(Duration::from_secs(1), frames.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let next = String::from_utf8(next.to_vec()).unwrap();
    assert!(next.contains("Alice lunch"));
    assert!(next.contains(r#""type":"add""#));
    assert!(!next.contains("Bob lunch"));
}

#[tokio::test]
async fn test_idle_stream_sends_keep_alive() {
    let (_, router) = setup_with_memory(Duration::from_millis(50));
    let alice = onboard(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(request("GET", &format!("/api/schedule/stream?token={alice}"), None, None))
        .await
        .unwrap();
    let mut frames = response.into_body().into_data_stream();

    assert!(next_frame(&mut frames).await.contains("event: connected"));
    let idle = next_frame(&mut frames).await;
    assert!(idle.starts_with(':'));
    assert!(idle.contains("keep-alive"));
}

#[tokio::test]
async fn test_closing_stream_releases_subscription() {
    let (memory, router) = setup_with_memory(Duration::from_secs(15));
    let alice = onboard(&router, "alice").await;
    let channel = user_channel(&UserId::from("alice"));

    let response = router
        .clone()
        .oneshot(request("GET", &format!("/api/schedule/stream?token={alice}"), None, None))
        .await
        .unwrap();
    let mut frames = response.into_body().into_data_stream();
    assert!(next_frame(&mut frames).await.contains("event: connected"));
    assert_eq!(memory.subscriber_count(&channel).await, 1);

    drop(frames);
    assert_eq!(memory.subscriber_count(&channel).await, 0);

    // Edits after the disconnect are stored but reach no one.
    let (status, _) = send(
        &router,
        request(
            "POST",
            "/api/schedule/events",
            Some(&alice),
            Some(json!({"title": "Gym", "start": "18:00", "date": "2026-03-02"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(memory.subscriber_count(&channel).await, 0);
}
