mod actor;
mod effector;
mod handle;
pub mod models;
pub mod token;

pub use actor::CALENDAR_API_BASE;
pub use effector::{CalendarEffector, SyncedCalendar};
pub use handle::GoogleCalendarHandle;
pub use models::{AccessToken, CalendarEvent, EventDraft, EventPatch, EventRecord};
pub use token::OAuthClient;

use crate::config::Config;
use crate::error::AppResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Google Calendar component owning the calendar actor
#[derive(Default)]
pub struct GoogleCalendar {
    handle: RwLock<Option<GoogleCalendarHandle>>,
}

impl GoogleCalendar {
    /// Create a new Google Calendar component
    pub fn new() -> Self {
        Self {
            handle: RwLock::new(None),
        }
    }

    /// Get the handle if it exists
    pub async fn get_handle(&self) -> Option<GoogleCalendarHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }
}

#[async_trait]
impl super::Component for GoogleCalendar {
    fn name(&self) -> &'static str {
        "google_calendar"
    }

    async fn init(&self, config: Arc<RwLock<Config>>) -> AppResult<()> {
        let calendar_id = {
            let config_read = config.read().await;
            config_read.google_calendar_id.clone()
        };

        // Create a new handle if one doesn't exist
        let mut handle_lock = self.handle.write().await;
        if handle_lock.is_none() {
            *handle_lock = Some(GoogleCalendarHandle::new(calendar_id, CALENDAR_API_BASE));
        }

        Ok(())
    }

    async fn shutdown(&self) -> AppResult<()> {
        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
