use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::llm::{parse_intent_reply, LanguageModel};
use super::model::{DispatchOutcome, IntentKind, NormalizedEvent, RawInput};
use super::normalize::normalize;
use super::prompt::system_prompt;
use crate::components::google_calendar::{AccessToken, CalendarEffector, EventDraft};
use crate::components::storage::ConversationLog;
use crate::error::{validation_error, AppResult, Error};

/// Title used when the model found an event but no name for it
pub const DEFAULT_EVENT_TITLE: &str = "Untitled event";

/// Turns free text into a normalized event and carries out what it asks for
pub struct IntentResolver {
    model: Arc<dyn LanguageModel>,
    calendar: Arc<dyn CalendarEffector>,
    log: Arc<dyn ConversationLog>,
    timezone: Tz,
}

impl IntentResolver {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        calendar: Arc<dyn CalendarEffector>,
        log: Arc<dyn ConversationLog>,
        timezone: Tz,
    ) -> Self {
        Self {
            model,
            calendar,
            log,
            timezone,
        }
    }

    /// Resolve `text` for `user_id` as of now
    pub async fn resolve(
        &self,
        user_id: &str,
        text: &str,
        credential: Option<&AccessToken>,
    ) -> AppResult<DispatchOutcome> {
        self.resolve_at(user_id, text, credential, Utc::now()).await
    }

    /// Resolve `text` for `user_id` with "today" pinned to `now`
    pub async fn resolve_at(
        &self,
        user_id: &str,
        text: &str,
        credential: Option<&AccessToken>,
        now: DateTime<Utc>,
    ) -> AppResult<DispatchOutcome> {
        let input = validate(user_id, text)?;

        // Audit trail comes first so failed model calls are still recorded
        self.log.append(&input.user_id, &input.text, false).await?;

        let prompt = system_prompt(now, self.timezone);
        let reply = self
            .model
            .complete(&prompt, &input.text)
            .await
            .inspect_err(|e| error!("Language model call failed for user {}: {}", input.user_id, e))?;

        let parsed = parse_intent_reply(&reply).map_err(|message| {
            error!("Unusable model reply for user {}: {}", input.user_id, message);
            Error::UpstreamParse {
                user_id: input.user_id.clone(),
                text: input.text.clone(),
                reply: reply.clone(),
                message,
            }
        })?;

        let event = normalize(parsed, self.timezone);
        let answer = serde_json::to_string(&event)?;
        self.log.append(&input.user_id, &answer, true).await?;

        info!(
            "Resolved intent {:?} for user {}",
            event.intent, input.user_id
        );

        self.dispatch(&input, event, credential).await
    }

    async fn dispatch(
        &self,
        input: &RawInput,
        event: NormalizedEvent,
        credential: Option<&AccessToken>,
    ) -> AppResult<DispatchOutcome> {
        match event.intent {
            IntentKind::ScheduleEvent => {
                let token = match require_credential(credential) {
                    Ok(token) => token,
                    Err(message) => return Err(dispatch_error(input, event, message)),
                };
                let interval = event
                    .interval()
                    .map(|(start, end)| (start.to_string(), end.to_string()));
                let Some((start_time, end_time)) = interval else {
                    return Err(dispatch_error(input, event, "Event has no usable time"));
                };
                let draft = EventDraft {
                    title: event
                        .title
                        .clone()
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string()),
                    start_time,
                    end_time,
                };

                match self.calendar.create_event(&input.user_id, draft, token).await {
                    Ok(record) => Ok(DispatchOutcome::Created(record)),
                    Err(e) => Err(dispatch_error(input, event, &e.to_string())),
                }
            }
            IntentKind::DeleteEvent => {
                let token = match require_credential(credential) {
                    Ok(token) => token,
                    Err(message) => return Err(dispatch_error(input, event, message)),
                };
                let google_event_id = match self.target_event_id(&input.user_id, &event).await {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        return Err(dispatch_error(input, event, "No matching event to delete"))
                    }
                    Err(e) => return Err(dispatch_error(input, event, &e.to_string())),
                };

                match self
                    .calendar
                    .delete_event(&input.user_id, &google_event_id, token)
                    .await
                {
                    Ok(()) => Ok(DispatchOutcome::Deleted { google_event_id }),
                    Err(e) => Err(dispatch_error(input, event, &e.to_string())),
                }
            }
            IntentKind::AddTask | IntentKind::None => Ok(DispatchOutcome::Informational(event)),
        }
    }

    /// The event a delete refers to: the id the model gave, else the user's
    /// earliest stored event whose title matches
    async fn target_event_id(
        &self,
        user_id: &str,
        event: &NormalizedEvent,
    ) -> AppResult<Option<String>> {
        if let Some(id) = event.event_id.as_deref().filter(|id| !id.trim().is_empty()) {
            return Ok(Some(id.to_string()));
        }

        let Some(title) = event.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let events = self.calendar.list_events(user_id).await?;
        Ok(events
            .into_iter()
            .find(|record| record.title.trim().eq_ignore_ascii_case(title))
            .map(|record| record.google_event_id))
    }
}

fn validate(user_id: &str, text: &str) -> AppResult<RawInput> {
    if user_id.trim().is_empty() {
        return Err(validation_error("Missing user id"));
    }
    if text.trim().is_empty() {
        return Err(validation_error("Missing text input"));
    }
    Ok(RawInput {
        user_id: user_id.to_string(),
        text: text.to_string(),
    })
}

fn require_credential(credential: Option<&AccessToken>) -> Result<&AccessToken, &'static str> {
    credential
        .filter(|token| !token.is_empty())
        .ok_or("Missing calendar access token")
}

fn dispatch_error(input: &RawInput, event: NormalizedEvent, message: &str) -> Error {
    warn!(
        "Dispatch of {:?} failed for user {}: {}",
        event.intent, input.user_id, message
    );
    Error::Dispatch {
        user_id: input.user_id.clone(),
        text: input.text.clone(),
        parsed: Box::new(event),
        message: message.to_string(),
    }
}
