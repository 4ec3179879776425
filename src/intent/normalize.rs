use chrono::Duration;
use chrono_tz::Tz;
use tracing::debug;

use super::model::{IntentKind, NormalizedEvent, ParsedIntent};
use crate::utils::time::{format_timestamp, parse_timestamp, shift};

/// Apply time completion and type the intent
pub fn normalize(parsed: ParsedIntent, tz: Tz) -> NormalizedEvent {
    let (start_time, end_time) =
        complete_interval(parsed.start_time.as_deref(), parsed.end_time.as_deref(), tz);

    NormalizedEvent {
        title: parsed.title,
        date: parsed.date,
        start_time,
        end_time,
        intent: IntentKind::from_raw(parsed.intent.as_deref()),
        event_id: parsed.event_id,
    }
}

/// Fill a one-sided interval with a one hour default.
///
/// Returns both times or neither. Anything that does not parse, and a pair
/// whose end is not after its start, collapses to `(None, None)`.
pub fn complete_interval(
    start: Option<&str>,
    end: Option<&str>,
    tz: Tz,
) -> (Option<String>, Option<String>) {
    let start = start.filter(|s| !s.trim().is_empty());
    let end = end.filter(|s| !s.trim().is_empty());

    let default_length = Duration::hours(1);

    let interval = match (start, end) {
        (None, None) => return (None, None),
        (Some(start), None) => {
            parse_timestamp(start, tz)
                .and_then(|start| shift(start, default_length).map(|end| (start, end)))
        }
        (None, Some(end)) => parse_timestamp(end, tz)
            .and_then(|end| shift(end, -default_length).map(|start| (start, end))),
        (Some(start), Some(end)) => {
            match (parse_timestamp(start, tz), parse_timestamp(end, tz)) {
                (Some(start), Some(end)) if end > start => Some((start, end)),
                (Some(_), Some(_)) => {
                    debug!("Dropping interval that does not move forward in time");
                    None
                }
                _ => None,
            }
        }
    };

    match interval {
        Some((start, end)) => (Some(format_timestamp(&start)), Some(format_timestamp(&end))),
        None => {
            debug!(?start, ?end, "Could not derive an interval, clearing both times");
            (None, None)
        }
    }
}
