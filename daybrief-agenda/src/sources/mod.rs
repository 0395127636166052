//! Concrete schedule source implementations.

pub mod google_calendar;
pub mod google_tasks;

pub use google_calendar::GoogleCalendarSource;
pub use google_tasks::GoogleTasksSource;

use crate::error::AgendaError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Title shown for entries the provider returned without one.
pub const UNTITLED: &str = "(no title)";

/// Join `segments` onto `base` as individually percent-encoded path segments.
///
/// Calendar ids routinely contain `@` and `#`, so they must never be pasted
/// into a URL string.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<url::Url, AgendaError> {
    let mut url = url::Url::parse(base)
        .map_err(|e| AgendaError::Config(format!("invalid base URL `{base}`: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| AgendaError::Config(format!("base URL `{base}` cannot have a path")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Start of `date` in `zone`, as an instant.
///
/// Normally local midnight. Where midnight falls in a DST gap, this is the
/// first wall-clock minute of the date that exists; where it is ambiguous,
/// the earlier occurrence. The result always lies on `date` in `zone`.
pub(crate) fn local_midnight(date: NaiveDate, zone: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..MINUTES_PER_DAY)
        .map(|minute| midnight + Duration::minutes(minute))
        .find_map(|local| zone.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

const MINUTES_PER_DAY: i64 = 24 * 60;

pub(crate) fn parse_instant(value: &str) -> Result<DateTime<Utc>, AgendaError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AgendaError::Parse(format!("invalid timestamp `{value}`: {e}")))
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, AgendaError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AgendaError::Parse(format!("invalid date `{value}`: {e}")))
}

pub(crate) fn title_or_placeholder(title: Option<String>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => t.trim().to_owned(),
        _ => UNTITLED.to_owned(),
    }
}
