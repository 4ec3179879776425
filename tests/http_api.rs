use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono_tz::Tz;
use planmate::components::google_calendar::OAuthClient;
use planmate::components::storage::InMemoryStore;
use planmate::http::auth::{AuthConfig, AuthService};
use planmate::http::{router, AppState};
use planmate::intent::IntentResolver;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::mocks::{reply, MockCalendar, ScriptedModel};

const JWT_SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    jwt: String,
}

fn test_app(model: Arc<ScriptedModel>) -> TestApp {
    let calendar = MockCalendar::new();
    let log = Arc::new(InMemoryStore::new());
    let auth_service = Arc::new(AuthService::new(AuthConfig {
        jwt_secret: JWT_SECRET.to_string(),
        token_expiration_minutes: 60,
    }));
    let jwt = auth_service.generate_token("user-1", None).unwrap();

    let state = AppState {
        resolver: Arc::new(IntentResolver::new(
            model,
            calendar.clone(),
            log.clone(),
            Tz::UTC,
        )),
        calendar,
        log,
        auth_service,
        oauth: Arc::new(OAuthClient::new(
            "client-id",
            "client-secret",
            "http://localhost:5000/api/google/callback",
        )),
    };

    TestApp {
        router: router(state),
        jwt,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.jwt));
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

fn schedule_reply() -> String {
    reply(
        Some("Meeting"),
        Some("2025-10-24T15:00:00Z"),
        None,
        Some("schedule_event"),
    )
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_api_requires_jwt() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let missing = app
        .router
        .clone()
        .oneshot(Request::get("/api/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let invalid = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/events")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_parse_schedules_event() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let (status, body) = app
        .send(
            "POST",
            "/api/parse",
            Some(json!({ "text": "Schedule a meeting tomorrow at 3pm", "accessToken": "ya29.test" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Event created");
    assert_eq!(body["event"]["start_time"], "2025-10-24T15:00:00Z");
    assert_eq!(body["event"]["end_time"], "2025-10-24T16:00:00Z");
    assert_eq!(body["event"]["user_id"], "user-1");

    let (status, body) = app.send("GET", "/api/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);

    let (status, body) = app.send("GET", "/api/conversation", None).await;
    assert_eq!(status, StatusCode::OK);
    let turns = body["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["is_bot"], false);
    assert_eq!(turns[1]["is_bot"], true);
}

#[tokio::test]
async fn test_parse_returns_informational_record() {
    let app = test_app(ScriptedModel::replying(&reply(
        Some("Buy milk"),
        None,
        None,
        Some("add_task"),
    )));

    let (status, body) = app
        .send("POST", "/api/parse", Some(json!({ "text": "remind me to buy milk" })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parsed"]["title"], "Buy milk");
    assert_eq!(body["parsed"]["intent"], "add_task");
    assert!(body["parsed"]["start_time"].is_null());
}

#[tokio::test]
async fn test_parse_rejects_empty_text() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let (status, body) = app
        .send("POST", "/api/parse", Some(json!({ "text": "" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing text input");

    let (_, body) = app.send("GET", "/api/conversation", None).await;
    assert!(body["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_parse_reports_unusable_model_reply() {
    let app = test_app(ScriptedModel::replying("I'm not sure what you mean."));

    let (status, body) = app
        .send("POST", "/api/parse", Some(json!({ "text": "do the thing" })))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_parse_without_calendar_token_is_server_error() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let (status, body) = app
        .send("POST", "/api/parse", Some(json!({ "text": "meeting at 3pm tomorrow" })))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Missing calendar access token");
    assert_eq!(body["parsed"]["end_time"], "2025-10-24T16:00:00Z");
}

#[tokio::test]
async fn test_event_crud() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let (status, body) = app
        .send("POST", "/api/events/add", Some(json!({ "title": "Gym", "accessToken": "ya29.test" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing event fields");

    let (status, body) = app
        .send(
            "POST",
            "/api/events/add",
            Some(json!({
                "title": "Gym",
                "start_time": "2025-10-25T07:00:00Z",
                "end_time": "2025-10-25T08:00:00Z",
                "accessToken": "ya29.test",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Event created");
    let google_event_id = body["event"]["google_event_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "PUT",
            "/api/events/update",
            Some(json!({
                "google_event_id": google_event_id,
                "title": "Leg day",
                "accessToken": "ya29.test",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event updated");
    assert_eq!(body["event"]["title"], "Leg day");
    assert_eq!(body["event"]["end_time"], "2025-10-25T08:00:00Z");

    let (status, body) = app
        .send("PUT", "/api/events/update", Some(json!({ "title": "Leg day" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = app
        .send(
            "DELETE",
            "/api/events/delete",
            Some(json!({ "google_event_id": google_event_id, "accessToken": "ya29.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event deleted successfully");

    let (_, body) = app.send("GET", "/api/events", None).await;
    assert!(body["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_google_auth_url() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/google/auth").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(url.contains("access_type=offline"));
    assert!(url.contains("client_id=client-id"));
}

#[tokio::test]
async fn test_google_callback_requires_code() {
    let app = test_app(ScriptedModel::replying(&schedule_reply()));

    let (status, body) = app.send("GET", "/api/google/callback", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing authorization code");
}
