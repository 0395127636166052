//! # daybrief-agenda
//!
//! Schedule aggregation and digest formatting for daybrief.
//!
//! ## Design
//!
//! - Collects events from every calendar and dated tasks from every task list
//! - Calendars and task lists are fetched concurrently, each container under
//!   its own timeout
//! - Graceful degradation: a failing container, or the whole task provider,
//!   only removes its own items
//! - A rejected credential on the calendar listing is the one failure that
//!   propagates, so an expired login is never mistaken for an empty day
//! - Deterministic ordering: stable sort by start, events before tasks on ties
//! - Rendering happens in the user's timezone
//!
//! ## Security
//!
//! - Credentials are passed per call and never stored or logged
//! - No network listeners; this is a library

pub mod aggregate;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod source;
pub mod sources;
pub mod types;
pub mod window;

pub use aggregate::Aggregator;
pub use config::AgendaConfig;
pub use error::{AgendaError, Result};
pub use format::format_schedule;
pub use source::ScheduleSource;
pub use sources::{GoogleCalendarSource, GoogleTasksSource};
pub use types::{Container, ItemKind, Mode, SourceKind, UnifiedItem};
pub use window::Window;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Aggregator wired to the Google Calendar and Google Tasks providers.
pub type GoogleAggregator = Aggregator<GoogleCalendarSource, GoogleTasksSource>;

/// Build a [`GoogleAggregator`] from a validated configuration.
///
/// # Errors
///
/// Returns [`AgendaError::Config`] if `config` is invalid, or
/// [`AgendaError::Http`] if an HTTP client cannot be built.
pub fn google_aggregator(config: &AgendaConfig) -> Result<GoogleAggregator> {
    config.validate()?;
    Ok(Aggregator::new(
        GoogleCalendarSource::new(config)?,
        GoogleTasksSource::new(config)?,
        config,
    ))
}

/// Collect and render a digest in one call.
///
/// Convenience wrapper around [`Aggregator::aggregate`] and
/// [`format_schedule`] for callers that only need the final text.
///
/// # Errors
///
/// Same as [`Aggregator::aggregate`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> daybrief_agenda::Result<()> {
/// let config = daybrief_agenda::AgendaConfig::default();
/// let aggregator = daybrief_agenda::google_aggregator(&config)?;
/// let text = daybrief_agenda::digest(
///     &aggregator,
///     "ya29.token",
///     daybrief_agenda::Mode::Daily,
///     chrono::Utc::now(),
///     chrono_tz::Europe::London,
/// )
/// .await?;
/// println!("{text}");
/// # Ok(())
/// # }
/// ```
pub async fn digest<C: ScheduleSource, T: ScheduleSource>(
    aggregator: &Aggregator<C, T>,
    credential: &str,
    mode: Mode,
    now: DateTime<Utc>,
    zone: Tz,
) -> Result<String> {
    let items = aggregator.aggregate(credential, mode, now, zone).await?;
    Ok(format_schedule(&items, mode, zone, now))
}
