use super::{keys, sort_by_start, ConversationLog, ConversationTurn, EventStore};
use crate::components::google_calendar::models::{EventPatch, EventRecord};
use crate::error::{storage_error, AppResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient, Script};
use tracing::info;

/// Merge a JSON patch into a stored event in one server-side step.
/// Null patch fields keep the stored value. Returns the updated record,
/// or nil when the event is not mirrored.
const UPDATE_EVENT_SCRIPT: &str = r#"
local raw = redis.call('HGET', KEYS[1], ARGV[1])
if not raw then
  return false
end
local record = cjson.decode(raw)
for field, value in pairs(cjson.decode(ARGV[2])) do
  if value ~= cjson.null then
    record[field] = value
  end
end
local updated = cjson.encode(record)
redis.call('HSET', KEYS[1], ARGV[1], updated)
return updated
"#;

/// Redis-backed conversation log and event mirror
pub struct RedisStore {
    client: RedisClient,
    update_script: Script,
}

impl RedisStore {
    /// Create a client and verify the server is reachable
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = RedisClient::open(redis_url)
            .map_err(|e| storage_error(&format!("Failed to create Redis client: {}", e)))?;

        let store = Self {
            client,
            update_script: Script::new(UPDATE_EVENT_SCRIPT),
        };
        let mut conn = store.get_connection().await?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| storage_error(&format!("Redis PING error: {}", e)))?;

        Ok(store)
    }

    /// Get a Redis connection from the client
    async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| storage_error(&format!("Failed to connect to Redis: {}", e)))
    }

    fn conversation_key(user_id: &str) -> String {
        format!("{}{}", keys::CONVERSATION_PREFIX, user_id)
    }

    fn events_key(user_id: &str) -> String {
        format!("{}{}", keys::EVENTS_PREFIX, user_id)
    }
}

#[async_trait]
impl ConversationLog for RedisStore {
    async fn append(&self, user_id: &str, content: &str, is_bot: bool) -> AppResult<ConversationTurn> {
        let turn = ConversationTurn::new(user_id, content, is_bot);
        let json = serde_json::to_string(&turn)?;

        let mut conn = self.get_connection().await?;
        conn.rpush::<_, _, ()>(Self::conversation_key(user_id), json)
            .await
            .map_err(|e| storage_error(&format!("Redis RPUSH error: {}", e)))?;

        Ok(turn)
    }

    async fn history(&self, user_id: &str) -> AppResult<Vec<ConversationTurn>> {
        let mut conn = self.get_connection().await?;
        let items: Vec<String> = conn
            .lrange(Self::conversation_key(user_id), 0, -1)
            .await
            .map_err(|e| storage_error(&format!("Redis LRANGE error: {}", e)))?;

        let turns = items
            .iter()
            .map(|item| serde_json::from_str(item))
            .collect::<Result<Vec<ConversationTurn>, _>>()?;
        Ok(turns)
    }
}

#[async_trait]
impl EventStore for RedisStore {
    async fn insert(&self, record: &EventRecord) -> AppResult<()> {
        let json = serde_json::to_string(record)?;

        let mut conn = self.get_connection().await?;
        conn.hset::<_, _, _, ()>(
            Self::events_key(&record.user_id),
            &record.google_event_id,
            json,
        )
        .await
        .map_err(|e| storage_error(&format!("Redis HSET error: {}", e)))?;

        info!(
            "Stored event {} for user {}",
            record.google_event_id, record.user_id
        );
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        google_event_id: &str,
        patch: &EventPatch,
    ) -> AppResult<Option<EventRecord>> {
        let patch_json = serde_json::to_string(patch)?;

        let mut conn = self.get_connection().await?;
        let updated: Option<String> = self
            .update_script
            .key(Self::events_key(user_id))
            .arg(google_event_id)
            .arg(patch_json)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| storage_error(&format!("Redis event update error: {}", e)))?;

        match updated {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, user_id: &str, google_event_id: &str) -> AppResult<bool> {
        let mut conn = self.get_connection().await?;
        let removed: i64 = conn
            .hdel(Self::events_key(user_id), google_event_id)
            .await
            .map_err(|e| storage_error(&format!("Redis HDEL error: {}", e)))?;

        Ok(removed > 0)
    }

    async fn find(&self, user_id: &str, google_event_id: &str) -> AppResult<Option<EventRecord>> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = conn
            .hget(Self::events_key(user_id), google_event_id)
            .await
            .map_err(|e| storage_error(&format!("Redis HGET error: {}", e)))?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, user_id: &str) -> AppResult<Vec<EventRecord>> {
        let mut conn = self.get_connection().await?;
        let items: Vec<String> = conn
            .hvals(Self::events_key(user_id))
            .await
            .map_err(|e| storage_error(&format!("Redis HVALS error: {}", e)))?;

        let mut events = items
            .iter()
            .map(|item| serde_json::from_str(item))
            .collect::<Result<Vec<EventRecord>, _>>()?;
        sort_by_start(&mut events);
        Ok(events)
    }
}
