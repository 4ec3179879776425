use super::models::{AccessToken, CalendarEvent, EventDraft, EventPatch};
use crate::error::{google_calendar_error, AppResult};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use url::Url;

/// Google Calendar REST API root
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Upper bound on a single Calendar API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    api: CalendarApi,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// REST calls against one calendar; cheap to clone into request tasks
#[derive(Clone)]
struct CalendarApi {
    calendar_id: String,
    api_base: String,
    client: Client,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    InsertEvent(
        EventDraft,
        AccessToken,
        mpsc::Sender<AppResult<CalendarEvent>>,
    ),
    UpdateEvent(
        String,
        EventPatch,
        AccessToken,
        mpsc::Sender<AppResult<CalendarEvent>>,
    ),
    DeleteEvent(String, AccessToken, mpsc::Sender<AppResult<()>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// Insert an event into the calendar
    pub async fn insert_event(
        &self,
        draft: EventDraft,
        token: AccessToken,
    ) -> AppResult<CalendarEvent> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::InsertEvent(draft, token, response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Patch an existing event
    pub async fn update_event(
        &self,
        event_id: String,
        patch: EventPatch,
        token: AccessToken,
    ) -> AppResult<CalendarEvent> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::UpdateEvent(
                event_id,
                patch,
                token,
                response_tx,
            ))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Remove an event from the calendar
    pub async fn delete_event(&self, event_id: String, token: AccessToken) -> AppResult<()> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::DeleteEvent(event_id, token, response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        calendar_id: impl Into<String>,
        api_base: impl Into<String>,
    ) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        let actor = Self {
            api: CalendarApi {
                calendar_id: calendar_id.into(),
                api_base: api_base.into(),
                client,
            },
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop. Each call runs in its own task so
    /// one slow request never holds up another caller.
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            let api = self.api.clone();
            match cmd {
                GoogleCalendarCommand::InsertEvent(draft, token, response_tx) => {
                    tokio::spawn(async move {
                        let result = api.insert_event(&draft, &token).await;
                        let _ = response_tx.send(result).await;
                    });
                }
                GoogleCalendarCommand::UpdateEvent(event_id, patch, token, response_tx) => {
                    tokio::spawn(async move {
                        let result = api.update_event(&event_id, &patch, &token).await;
                        let _ = response_tx.send(result).await;
                    });
                }
                GoogleCalendarCommand::DeleteEvent(event_id, token, response_tx) => {
                    tokio::spawn(async move {
                        let result = api.delete_event(&event_id, &token).await;
                        let _ = response_tx.send(result).await;
                    });
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }
}

impl CalendarApi {
    /// `.../calendars/{calendarId}/events[/{eventId}]`
    fn events_url(&self, event_id: Option<&str>) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| google_calendar_error("Calendar API URL cannot have a path"))?;
            segments
                .pop_if_empty()
                .extend(["calendars", self.calendar_id.as_str(), "events"]);
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }

        Ok(url)
    }

    async fn insert_event(
        &self,
        draft: &EventDraft,
        token: &AccessToken,
    ) -> AppResult<CalendarEvent> {
        let url = self.events_url(None)?;
        let body = json!({
            "summary": draft.title,
            "start": { "dateTime": draft.start_time },
            "end": { "dateTime": draft.end_time },
        });

        let request = self.client.post(url).json(&body);
        let response_data = Self::send(request, token, "insert event").await?;

        let event = CalendarEvent::from_api(&response_data);
        if event.id.is_empty() {
            return Err(google_calendar_error("Inserted event has no id"));
        }

        info!("Created calendar event {}", event.id);
        Ok(event)
    }

    async fn update_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
        token: &AccessToken,
    ) -> AppResult<CalendarEvent> {
        let url = self.events_url(Some(event_id))?;

        let mut body = Map::new();
        if let Some(title) = &patch.title {
            body.insert("summary".to_string(), json!(title));
        }
        if let Some(start_time) = &patch.start_time {
            body.insert("start".to_string(), json!({ "dateTime": start_time }));
        }
        if let Some(end_time) = &patch.end_time {
            body.insert("end".to_string(), json!({ "dateTime": end_time }));
        }

        let request = self.client.patch(url).json(&Value::Object(body));
        let response_data = Self::send(request, token, "update event").await?;

        info!("Updated calendar event {}", event_id);
        Ok(CalendarEvent::from_api(&response_data))
    }

    async fn delete_event(&self, event_id: &str, token: &AccessToken) -> AppResult<()> {
        let url = self.events_url(Some(event_id))?;

        let response = self
            .client
            .delete(url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to delete event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            error!("Delete event {} failed: HTTP {}", event_id, status);
            return Err(google_calendar_error(&format!(
                "Failed to delete event: HTTP {} - {}",
                status, error_body
            )));
        }

        info!("Deleted calendar event {}", event_id);
        Ok(())
    }

    /// Send an authorized request and decode the JSON reply
    async fn send(request: RequestBuilder, token: &AccessToken, action: &str) -> AppResult<Value> {
        let response = request
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            error!("Failed to {}: HTTP {}", action, status);
            return Err(google_calendar_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse {} response: {}", action, e))
        })
    }
}
