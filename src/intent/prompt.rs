use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::utils::time::today_in;

const SYSTEM_PROMPT_TEMPLATE: &str = "You extract calendar tasks and events from a user's message.

Today is {today} ({weekday}). Interpret relative phrases such as \"tomorrow\", \"tonight\" or \"next week\" relative to today, in the {timezone} timezone.

Respond with a single JSON object and nothing else. No markdown, no code fences, no explanations. The object must contain exactly these keys:
{
  \"title\": short name of the task or event, or null,
  \"date\": \"YYYY-MM-DD\" or null,
  \"start_time\": ISO 8601 date-time with UTC offset, or null,
  \"end_time\": ISO 8601 date-time with UTC offset, or null,
  \"intent\": one of \"schedule_event\", \"delete_event\", \"add_task\", or null
}

Use \"schedule_event\" when the user wants something put on their calendar at a time, \"delete_event\" when they want an existing event cancelled or removed, and \"add_task\" for to-dos without a time. Use null for anything else.
If the user names a specific calendar event identifier for deletion, also include it as \"event_id\".
Leave a field null rather than guessing when the message does not say.";

/// Build the system instruction for a resolution happening at `now`
pub fn system_prompt(now: DateTime<Utc>, tz: Tz) -> String {
    let today = today_in(now, tz);

    SYSTEM_PROMPT_TEMPLATE
        .replace("{today}", &today.format("%Y-%m-%d").to_string())
        .replace("{weekday}", &today.format("%A").to_string())
        .replace("{timezone}", tz.name())
}
