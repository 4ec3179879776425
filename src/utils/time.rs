use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
    Utc,
};
use chrono_tz::Tz;

/// Offset-less layouts accepted from the language model
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Years that RFC 3339 can write with four digits
const RFC3339_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parse an ISO 8601 timestamp.
///
/// Values carrying an offset (or `Z`) are taken as-is. Offset-less values are
/// read as wall-clock time in `tz`; a wall-clock time skipped by a DST jump does
/// not parse, and an ambiguous one resolves to the earlier instant. Years
/// outside 0000-9999 do not parse.
pub fn parse_timestamp(value: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    parse_any_year(value, tz).filter(is_rfc3339_year)
}

fn parse_any_year(value: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;

    let local = match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => return None,
    };

    Some(local.fixed_offset())
}

fn is_rfc3339_year(dt: &DateTime<FixedOffset>) -> bool {
    RFC3339_YEARS.contains(&dt.year())
}

/// `dt + delta`, or `None` when the result overflows or leaves 0000-9999
pub fn shift(dt: DateTime<FixedOffset>, delta: Duration) -> Option<DateTime<FixedOffset>> {
    dt.checked_add_signed(delta).filter(is_rfc3339_year)
}

/// Render a timestamp as RFC 3339 with whole seconds, `Z` for UTC
pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar date of `now` in `tz`
pub fn today_in(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}
