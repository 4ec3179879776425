//! JSON API in front of the intent resolver and the calendar effector.

pub mod auth;
pub mod handlers;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::components::google_calendar::{CalendarEffector, OAuthClient};
use crate::components::storage::ConversationLog;
use crate::error::Error;
use crate::intent::IntentResolver;
use auth::AuthService;
use handlers::{
    add_event_handler, conversation_handler, delete_event_handler, google_auth_handler,
    google_callback_handler, google_refresh_handler, health_handler, list_events_handler,
    parse_handler, update_event_handler,
};

#[derive(Clone)]
pub struct AppState {
    /// Free text to calendar action
    pub resolver: Arc<IntentResolver>,
    /// Direct event CRUD
    pub calendar: Arc<dyn CalendarEffector>,
    /// Conversation history reads
    pub log: Arc<dyn ConversationLog>,
    /// Auth service for JWT operations
    pub auth_service: Arc<AuthService>,
    /// Google OAuth2 token exchange
    pub oauth: Arc<OAuthClient>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/parse", post(parse_handler))
        .route("/api/events", get(list_events_handler))
        .route("/api/events/add", post(add_event_handler))
        .route("/api/events/update", put(update_event_handler))
        .route("/api/events/delete", delete(delete_event_handler))
        .route("/api/conversation", get(conversation_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/api/google/auth", get(google_auth_handler))
        .route("/api/google/callback", get(google_callback_handler))
        .route("/api/google/refresh", post(google_refresh_handler))
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            Error::UpstreamParse { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to parse response", "details": message }),
            ),
            Error::Dispatch {
                parsed, message, ..
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message, "parsed": parsed }),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": other.to_string() }),
            ),
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(body)).into_response()
    }
}
