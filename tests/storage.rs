use chrono::Utc;
use planmate::components::google_calendar::{EventPatch, EventRecord};
use planmate::components::storage::{ConversationLog, EventStore, InMemoryStore, RedisStore};
use std::sync::Arc;

fn record(user_id: &str, google_event_id: &str, title: &str, start: &str, end: &str) -> EventRecord {
    EventRecord {
        id: format!("local-{google_event_id}"),
        user_id: user_id.to_string(),
        title: title.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        google_event_id: google_event_id.to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_conversation_is_ordered_per_user() {
    let store = InMemoryStore::new();

    store.append("alice", "book dentist", false).await.unwrap();
    store.append("bob", "hello", false).await.unwrap();
    store.append("alice", "{\"intent\":null}", true).await.unwrap();

    let alice = store.history("alice").await.unwrap();
    assert_eq!(alice.len(), 2);
    assert_eq!(alice[0].content, "book dentist");
    assert!(!alice[0].is_bot);
    assert!(alice[1].is_bot);
    assert_ne!(alice[0].id, alice[1].id);

    assert_eq!(store.history("bob").await.unwrap().len(), 1);
    assert!(store.history("carol").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_events_list_by_start_instant() {
    let store = InMemoryStore::new();

    store
        .insert(&record("alice", "late", "Late", "2025-10-24T18:00:00Z", "2025-10-24T19:00:00Z"))
        .await
        .unwrap();
    // 16:00 UTC, earlier than 18:00Z but sorts later as plain text
    store
        .insert(&record(
            "alice",
            "offset",
            "Offset",
            "2025-10-24T12:00:00-04:00",
            "2025-10-24T13:00:00-04:00",
        ))
        .await
        .unwrap();
    store
        .insert(&record("alice", "early", "Early", "2025-10-24T08:00:00Z", "2025-10-24T09:00:00Z"))
        .await
        .unwrap();
    store
        .insert(&record("bob", "other", "Other", "2025-10-24T07:00:00Z", "2025-10-24T08:00:00Z"))
        .await
        .unwrap();

    let ids: Vec<String> = store
        .list("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.google_event_id)
        .collect();
    assert_eq!(ids, vec!["early", "offset", "late"]);
}

#[tokio::test]
async fn test_update_keeps_unspecified_fields() {
    let store = InMemoryStore::new();
    store
        .insert(&record("alice", "g1", "Standup", "2025-10-24T09:00:00Z", "2025-10-24T09:15:00Z"))
        .await
        .unwrap();

    let patch = EventPatch {
        title: Some("Daily standup".to_string()),
        ..Default::default()
    };
    let updated = store.update("alice", "g1", &patch).await.unwrap().unwrap();
    assert_eq!(updated.title, "Daily standup");
    assert_eq!(updated.start_time, "2025-10-24T09:00:00Z");
    assert_eq!(updated.end_time, "2025-10-24T09:15:00Z");

    let found = store.find("alice", "g1").await.unwrap().unwrap();
    assert_eq!(found, updated);

    // Another user's event id is not reachable
    assert!(store.update("bob", "g1", &patch).await.unwrap().is_none());
    assert!(store.update("alice", "missing", &patch).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_reports_removal() {
    let store = InMemoryStore::new();
    store
        .insert(&record("alice", "g1", "Gym", "2025-10-24T07:00:00Z", "2025-10-24T08:00:00Z"))
        .await
        .unwrap();

    assert!(!store.delete("bob", "g1").await.unwrap());
    assert!(store.delete("alice", "g1").await.unwrap());
    assert!(!store.delete("alice", "g1").await.unwrap());
    assert!(store.find("alice", "g1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_replaces_same_google_event() {
    let store = InMemoryStore::new();
    store
        .insert(&record("alice", "g1", "First", "2025-10-24T07:00:00Z", "2025-10-24T08:00:00Z"))
        .await
        .unwrap();
    store
        .insert(&record("alice", "g1", "Second", "2025-10-24T07:00:00Z", "2025-10-24T08:00:00Z"))
        .await
        .unwrap();

    let events = store.list("alice").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Second");
}

/// Concurrent patches to different fields of one mirrored event all land.
/// Needs a reachable Redis (`REDIS_URL`, default local); skipped otherwise.
#[tokio::test]
async fn test_redis_concurrent_updates_keep_every_field() {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let store = match RedisStore::connect(&url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Skipping Redis update test: {e}");
            return;
        }
    };

    let user_id = format!("test-{}", uuid::Uuid::new_v4());
    store
        .insert(&record(&user_id, "g1", "Standup", "2025-10-24T09:00:00Z", "2025-10-24T09:15:00Z"))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for round in 0..20 {
        let title_store = Arc::clone(&store);
        let title_user = user_id.clone();
        tasks.push(tokio::spawn(async move {
            let patch = EventPatch {
                title: Some(format!("Standup {round}")),
                ..Default::default()
            };
            title_store.update(&title_user, "g1", &patch).await
        }));

        let end_store = Arc::clone(&store);
        let end_user = user_id.clone();
        tasks.push(tokio::spawn(async move {
            let patch = EventPatch {
                end_time: Some(format!("2025-10-24T10:{round:02}:00Z")),
                ..Default::default()
            };
            end_store.update(&end_user, "g1", &patch).await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().unwrap().is_some());
    }

    let stored = store.find(&user_id, "g1").await.unwrap().unwrap();
    assert!(stored.title.starts_with("Standup "));
    assert_ne!(stored.title, "Standup");
    assert!(stored.end_time.starts_with("2025-10-24T10:"));
    assert_eq!(stored.start_time, "2025-10-24T09:00:00Z");
    assert_eq!(stored.user_id, user_id);

    assert!(store.delete(&user_id, "g1").await.unwrap());
}
