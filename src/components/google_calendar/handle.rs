use super::actor::{GoogleCalendarActor, GoogleCalendarActorHandle};
use super::models::{AccessToken, CalendarEvent, EventDraft, EventPatch};
use crate::error::AppResult;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(calendar_id: impl Into<String>, api_base: impl Into<String>) -> Self {
        let (mut actor, handle) = GoogleCalendarActor::new(calendar_id, api_base);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    pub async fn insert_event(
        &self,
        draft: EventDraft,
        token: AccessToken,
    ) -> AppResult<CalendarEvent> {
        self.actor_handle.insert_event(draft, token).await
    }

    pub async fn update_event(
        &self,
        event_id: String,
        patch: EventPatch,
        token: AccessToken,
    ) -> AppResult<CalendarEvent> {
        self.actor_handle.update_event(event_id, patch, token).await
    }

    pub async fn delete_event(&self, event_id: String, token: AccessToken) -> AppResult<()> {
        self.actor_handle.delete_event(event_id, token).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}
