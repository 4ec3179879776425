use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::components::google_calendar::models::EventRecord;

/// A user's free-text utterance
#[derive(Debug, Clone)]
pub struct RawInput {
    pub user_id: String,
    pub text: String,
}

/// Fields the model is instructed to return; each may be `null` but must be present
pub const REQUIRED_KEYS: [&str; 5] = ["title", "date", "start_time", "end_time", "intent"];

/// Structured reply from the language model, before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub title: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub intent: Option<String>,
    /// Calendar event the model resolved for delete requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// What the user asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IntentKind {
    ScheduleEvent,
    DeleteEvent,
    AddTask,
    #[default]
    None,
}

impl IntentKind {
    /// Map the model's raw `intent` string. Matching is exact and
    /// case-sensitive; anything unrecognised is `None`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("schedule_event") => IntentKind::ScheduleEvent,
            Some("delete_event") => IntentKind::DeleteEvent,
            Some("add_task") => IntentKind::AddTask,
            _ => IntentKind::None,
        }
    }

    /// Wire name, `None` for the null intent
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            IntentKind::ScheduleEvent => Some("schedule_event"),
            IntentKind::DeleteEvent => Some("delete_event"),
            IntentKind::AddTask => Some("add_task"),
            IntentKind::None => None,
        }
    }
}

impl Serialize for IntentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for IntentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(IntentKind::from_raw(raw.as_deref()))
    }
}

/// A parsed intent after time completion.
///
/// Either both times are set, parse, and `end_time > start_time`, or both are
/// `None` and the record is not schedulable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub title: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub intent: IntentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl NormalizedEvent {
    /// The event's interval, if it has one
    pub fn interval(&self) -> Option<(&str, &str)> {
        match (&self.start_time, &self.end_time) {
            (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }

    pub fn is_schedulable(&self) -> bool {
        self.interval().is_some()
    }
}

/// Final result of a resolution
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A calendar event was created and mirrored
    Created(EventRecord),
    /// A calendar event was removed
    Deleted { google_event_id: String },
    /// No calendar effect; the normalized record is the answer
    Informational(NormalizedEvent),
}
