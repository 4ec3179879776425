mod memory;
mod redis_store;

pub use self::memory::InMemoryStore;
pub use self::redis_store::RedisStore;

use crate::components::google_calendar::models::{EventPatch, EventRecord};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Redis keys
pub mod keys {
    pub const CONVERSATION_PREFIX: &str = "planmate:conversation:";
    pub const EVENTS_PREFIX: &str = "planmate:events:";
}

/// One message in a user's conversation with the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(user_id: &str, content: impl Into<String>, is_bot: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            content: content.into(),
            is_bot,
            created_at: Utc::now(),
        }
    }
}

/// Append-only log of conversation turns
#[async_trait]
pub trait ConversationLog: Send + Sync + 'static {
    /// Append a turn
    async fn append(&self, user_id: &str, content: &str, is_bot: bool) -> AppResult<ConversationTurn>;

    /// All turns for a user, oldest first
    async fn history(&self, user_id: &str) -> AppResult<Vec<ConversationTurn>>;
}

/// Local mirror of the events created through this service
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    async fn insert(&self, record: &EventRecord) -> AppResult<()>;

    /// Patch a mirrored event; `None` when the user has no such event
    async fn update(
        &self,
        user_id: &str,
        google_event_id: &str,
        patch: &EventPatch,
    ) -> AppResult<Option<EventRecord>>;

    /// Remove a mirrored event; `true` when something was removed
    async fn delete(&self, user_id: &str, google_event_id: &str) -> AppResult<bool>;

    async fn find(&self, user_id: &str, google_event_id: &str) -> AppResult<Option<EventRecord>>;

    /// All events for a user ordered by start time
    async fn list(&self, user_id: &str) -> AppResult<Vec<EventRecord>>;
}

/// Order events by start time, then creation time.
///
/// Start times are compared as instants when both parse, so mixed offsets sort
/// correctly.
pub(crate) fn sort_by_start(events: &mut [EventRecord]) {
    events.sort_by(|a, b| {
        let start_a = DateTime::parse_from_rfc3339(&a.start_time).ok();
        let start_b = DateTime::parse_from_rfc3339(&b.start_time).ok();
        match (start_a, start_b) {
            (Some(start_a), Some(start_b)) => start_a.cmp(&start_b),
            _ => a.start_time.cmp(&b.start_time),
        }
        .then_with(|| a.created_at.cmp(&b.created_at))
    });
}
