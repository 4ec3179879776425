use super::handle::GoogleCalendarHandle;
use super::models::{AccessToken, EventDraft, EventPatch, EventRecord};
use crate::components::storage::EventStore;
use crate::error::{google_calendar_error, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Calendar mutations, each followed by a write to the local mirror
#[async_trait]
pub trait CalendarEffector: Send + Sync + 'static {
    async fn create_event(
        &self,
        user_id: &str,
        draft: EventDraft,
        token: &AccessToken,
    ) -> AppResult<EventRecord>;

    async fn update_event(
        &self,
        user_id: &str,
        google_event_id: &str,
        patch: EventPatch,
        token: &AccessToken,
    ) -> AppResult<Option<EventRecord>>;

    async fn delete_event(
        &self,
        user_id: &str,
        google_event_id: &str,
        token: &AccessToken,
    ) -> AppResult<()>;

    /// The user's mirrored events ordered by start time
    async fn list_events(&self, user_id: &str) -> AppResult<Vec<EventRecord>>;
}

/// Google Calendar plus the event mirror
pub struct SyncedCalendar {
    calendar: GoogleCalendarHandle,
    store: Arc<dyn EventStore>,
}

impl SyncedCalendar {
    pub fn new(calendar: GoogleCalendarHandle, store: Arc<dyn EventStore>) -> Self {
        Self { calendar, store }
    }
}

#[async_trait]
impl CalendarEffector for SyncedCalendar {
    async fn create_event(
        &self,
        user_id: &str,
        draft: EventDraft,
        token: &AccessToken,
    ) -> AppResult<EventRecord> {
        let created = self
            .calendar
            .insert_event(draft.clone(), token.clone())
            .await?;

        let record = EventRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: draft.title,
            start_time: draft.start_time,
            end_time: draft.end_time,
            google_event_id: created.id,
            created_at: Utc::now(),
        };
        self.store.insert(&record).await?;

        info!(
            "Event {} created for user {}",
            record.google_event_id, user_id
        );
        Ok(record)
    }

    async fn update_event(
        &self,
        user_id: &str,
        google_event_id: &str,
        patch: EventPatch,
        token: &AccessToken,
    ) -> AppResult<Option<EventRecord>> {
        self.calendar
            .update_event(google_event_id.to_string(), patch.clone(), token.clone())
            .await?;

        let updated = self.store.update(user_id, google_event_id, &patch).await?;
        if updated.is_none() {
            warn!(
                "Updated event {} has no local mirror for user {}",
                google_event_id, user_id
            );
        }
        Ok(updated)
    }

    async fn delete_event(
        &self,
        user_id: &str,
        google_event_id: &str,
        token: &AccessToken,
    ) -> AppResult<()> {
        if google_event_id.trim().is_empty() {
            return Err(google_calendar_error("Missing event id"));
        }

        self.calendar
            .delete_event(google_event_id.to_string(), token.clone())
            .await?;

        if !self.store.delete(user_id, google_event_id).await? {
            warn!(
                "Deleted event {} had no local mirror for user {}",
                google_event_id, user_id
            );
        }
        Ok(())
    }

    async fn list_events(&self, user_id: &str) -> AppResult<Vec<EventRecord>> {
        self.store.list(user_id).await
    }
}
