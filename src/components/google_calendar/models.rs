use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simplified Google Calendar event representation
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub start_date_time: Option<String>,
    pub end_date_time: Option<String>,
    pub html_link: Option<String>,
}

impl CalendarEvent {
    /// Read the fields we care about from an events resource
    pub fn from_api(event: &serde_json::Value) -> Self {
        let text = |value: Option<&serde_json::Value>| {
            value.and_then(|v| v.as_str()).map(|s| s.to_string())
        };

        Self {
            id: event
                .get("id")
                .and_then(|id| id.as_str())
                .unwrap_or("")
                .to_string(),
            summary: text(event.get("summary")),
            start_date_time: text(event.get("start").and_then(|start| start.get("dateTime"))),
            end_date_time: text(event.get("end").and_then(|end| end.get("dateTime"))),
            html_link: text(event.get("htmlLink")),
        }
    }
}

/// Event to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
}

/// Partial update; `None` leaves the field as it was
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// A mirrored calendar event, one per Google event per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub google_event_id: String,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Apply a patch, keeping the current value of every unset field
    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(start_time) = &patch.start_time {
            self.start_time = start_time.clone();
        }
        if let Some(end_time) = &patch.end_time {
            self.end_time = end_time.clone();
        }
    }
}

/// A user's Google OAuth access token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

// Keep tokens out of logs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_api() {
        let event = CalendarEvent::from_api(&json!({
            "id": "abcd1234",
            "summary": "Team sync",
            "htmlLink": "https://calendar.google.com/event?eid=abcd1234",
            "start": { "dateTime": "2025-10-23T15:00:00Z" },
            "end": { "dateTime": "2025-10-23T16:00:00Z" }
        }));
        assert_eq!(event.id, "abcd1234");
        assert_eq!(event.summary.as_deref(), Some("Team sync"));
        assert_eq!(event.start_date_time.as_deref(), Some("2025-10-23T15:00:00Z"));
        assert_eq!(event.end_date_time.as_deref(), Some("2025-10-23T16:00:00Z"));

        let bare = CalendarEvent::from_api(&json!({ "start": { "date": "2025-10-23" } }));
        assert_eq!(bare.id, "");
        assert_eq!(bare.start_date_time, None);
    }

    #[test]
    fn test_apply_patch_keeps_unset_fields() {
        let mut record = EventRecord {
            id: "1".to_string(),
            user_id: "user-1".to_string(),
            title: "Meeting with team".to_string(),
            start_time: "2025-10-23T15:00:00Z".to_string(),
            end_time: "2025-10-23T16:00:00Z".to_string(),
            google_event_id: "abcd1234".to_string(),
            created_at: Utc::now(),
        };
        record.apply(&EventPatch {
            title: Some("New Team Sync".to_string()),
            ..Default::default()
        });
        assert_eq!(record.title, "New Team Sync");
        assert_eq!(record.start_time, "2025-10-23T15:00:00Z");
        assert_eq!(record.end_time, "2025-10-23T16:00:00Z");
    }

    #[test]
    fn test_access_token_is_redacted() {
        let token = AccessToken::new("ya29.secret");
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
        assert_eq!(token.as_str(), "ya29.secret");
        assert!(AccessToken::new("  ").is_empty());
    }
}
