use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::auth::JwtAuth;
use super::AppState;
use crate::components::google_calendar::{AccessToken, EventDraft, EventPatch};
use crate::error::{validation_error, AppResult, Error};
use crate::intent::DispatchOutcome;

type ApiResponse = AppResult<(StatusCode, Json<Value>)>;

/// Body of `POST /api/parse`
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: Option<String>,
    #[serde(rename = "accessToken")]
    pub access_token: Option<AccessToken>,
}

/// Body of `POST /api/events/add`
#[derive(Debug, Deserialize)]
pub struct AddEventRequest {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "accessToken")]
    pub access_token: Option<AccessToken>,
}

/// Body of `PUT /api/events/update`
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub google_event_id: Option<String>,
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "accessToken")]
    pub access_token: Option<AccessToken>,
}

/// Body of `DELETE /api/events/delete`
#[derive(Debug, Deserialize)]
pub struct DeleteEventRequest {
    pub google_event_id: Option<String>,
    #[serde(rename = "accessToken")]
    pub access_token: Option<AccessToken>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Non-blank string field
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn present_token(token: Option<AccessToken>) -> Option<AccessToken> {
    token.filter(|t| !t.is_empty())
}

/// Resolve free text into an intent and act on it
pub async fn parse_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<JwtAuth>,
    Json(body): Json<ParseRequest>,
) -> ApiResponse {
    let text = body.text.unwrap_or_default();
    let outcome = state
        .resolver
        .resolve(auth.user_id(), &text, body.access_token.as_ref())
        .await?;

    Ok(match outcome {
        DispatchOutcome::Informational(parsed) => {
            (StatusCode::OK, Json(json!({ "parsed": parsed })))
        }
        DispatchOutcome::Created(event) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Event created", "event": event })),
        ),
        DispatchOutcome::Deleted { google_event_id } => (
            StatusCode::OK,
            Json(json!({
                "message": "Event deleted successfully",
                "google_event_id": google_event_id,
            })),
        ),
    })
}

/// Create a calendar event and mirror it
pub async fn add_event_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<JwtAuth>,
    Json(body): Json<AddEventRequest>,
) -> ApiResponse {
    let (Some(title), Some(start_time), Some(end_time), Some(token)) = (
        present(body.title),
        present(body.start_time),
        present(body.end_time),
        present_token(body.access_token),
    ) else {
        return Err(validation_error("Missing event fields"));
    };

    let draft = EventDraft {
        title,
        start_time,
        end_time,
    };
    let event = state
        .calendar
        .create_event(auth.user_id(), draft, &token)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event created", "event": event })),
    ))
}

/// Patch a calendar event and its mirror
pub async fn update_event_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<JwtAuth>,
    Json(body): Json<UpdateEventRequest>,
) -> ApiResponse {
    let (Some(google_event_id), Some(token)) = (
        present(body.google_event_id),
        present_token(body.access_token),
    ) else {
        return Err(validation_error("Missing required fields"));
    };

    let patch = EventPatch {
        title: present(body.title),
        start_time: present(body.start_time),
        end_time: present(body.end_time),
    };
    let event = state
        .calendar
        .update_event(auth.user_id(), &google_event_id, patch, &token)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Event updated", "event": event })),
    ))
}

/// Remove a calendar event and its mirror
pub async fn delete_event_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<JwtAuth>,
    Json(body): Json<DeleteEventRequest>,
) -> ApiResponse {
    let (Some(google_event_id), Some(token)) = (
        present(body.google_event_id),
        present_token(body.access_token),
    ) else {
        return Err(validation_error("Missing required fields"));
    };

    state
        .calendar
        .delete_event(auth.user_id(), &google_event_id, &token)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Event deleted successfully" })),
    ))
}

/// The caller's mirrored events, earliest first
pub async fn list_events_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<JwtAuth>,
) -> ApiResponse {
    let events = state.calendar.list_events(auth.user_id()).await?;
    Ok((StatusCode::OK, Json(json!({ "events": events }))))
}

/// The caller's conversation, oldest turn first
pub async fn conversation_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<JwtAuth>,
) -> ApiResponse {
    let turns = state.log.history(auth.user_id()).await?;
    Ok((StatusCode::OK, Json(json!({ "turns": turns }))))
}

/// Consent URL for the front end to redirect to
pub async fn google_auth_handler(State(state): State<AppState>) -> ApiResponse {
    let url = state.oauth.authorization_url()?;
    Ok((StatusCode::OK, Json(json!({ "url": url }))))
}

/// OAuth redirect target; trades the code for tokens
pub async fn google_callback_handler(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResponse {
    let Some(code) = present(query.code) else {
        return Err(validation_error("Missing authorization code"));
    };

    match state.oauth.exchange_code(&code).await {
        Ok(tokens) => {
            info!("OAuth callback completed");
            Ok((StatusCode::OK, Json(tokens)))
        }
        Err(e) => {
            error!("OAuth callback error: {}", e);
            Err(Error::GoogleCalendar("OAuth2 callback failed".to_string()))
        }
    }
}

/// Trade a refresh token for a fresh access token
pub async fn google_refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResponse {
    let Some(refresh_token) = present(body.refresh_token) else {
        return Err(validation_error("Missing refresh token"));
    };

    let tokens = state.oauth.refresh_token(&refresh_token).await?;
    Ok((StatusCode::OK, Json(tokens)))
}

// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}
