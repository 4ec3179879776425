use super::{sort_by_start, ConversationLog, ConversationTurn, EventStore};
use crate::components::google_calendar::models::{EventPatch, EventRecord};
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory implementation of the stores (for testing and as a fallback)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
    events: RwLock<HashMap<String, Vec<EventRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationLog for InMemoryStore {
    async fn append(&self, user_id: &str, content: &str, is_bot: bool) -> AppResult<ConversationTurn> {
        let turn = ConversationTurn::new(user_id, content, is_bot);
        let mut turns = self.turns.write().await;
        turns
            .entry(user_id.to_string())
            .or_default()
            .push(turn.clone());
        Ok(turn)
    }

    async fn history(&self, user_id: &str) -> AppResult<Vec<ConversationTurn>> {
        let turns = self.turns.read().await;
        Ok(turns.get(user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn insert(&self, record: &EventRecord) -> AppResult<()> {
        let mut events = self.events.write().await;
        let user_events = events.entry(record.user_id.clone()).or_default();
        user_events.retain(|e| e.google_event_id != record.google_event_id);
        user_events.push(record.clone());
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        google_event_id: &str,
        patch: &EventPatch,
    ) -> AppResult<Option<EventRecord>> {
        let mut events = self.events.write().await;
        let record = events
            .get_mut(user_id)
            .and_then(|user_events| {
                user_events
                    .iter_mut()
                    .find(|e| e.google_event_id == google_event_id)
            });

        Ok(record.map(|record| {
            record.apply(patch);
            record.clone()
        }))
    }

    async fn delete(&self, user_id: &str, google_event_id: &str) -> AppResult<bool> {
        let mut events = self.events.write().await;
        let Some(user_events) = events.get_mut(user_id) else {
            return Ok(false);
        };
        let before = user_events.len();
        user_events.retain(|e| e.google_event_id != google_event_id);
        Ok(user_events.len() != before)
    }

    async fn find(&self, user_id: &str, google_event_id: &str) -> AppResult<Option<EventRecord>> {
        let events = self.events.read().await;
        Ok(events.get(user_id).and_then(|user_events| {
            user_events
                .iter()
                .find(|e| e.google_event_id == google_event_id)
                .cloned()
        }))
    }

    async fn list(&self, user_id: &str) -> AppResult<Vec<EventRecord>> {
        let events = self.events.read().await;
        let mut user_events = events.get(user_id).cloned().unwrap_or_default();
        sort_by_start(&mut user_events);
        Ok(user_events)
    }
}
