//! The aggregator: concurrent calendar + task collection, merged and clipped.

use crate::config::AgendaConfig;
use crate::error::AgendaError;
use crate::source::ScheduleSource;
use crate::types::{Mode, UnifiedItem};
use crate::window::Window;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::time::Duration;

use super::collect::collect_source;
use super::merge::{clip, merge};

/// Merges a calendar source and a task source into one windowed schedule.
///
/// # Pipeline
///
/// 1. Build the [`Window`] for the mode at `now`
/// 2. Collect calendar and task sources concurrently with [`tokio::join!`]
/// 3. Propagate a rejected credential from the calendar listing; swallow
///    every other failure as an empty contribution
/// 4. Concatenate events then tasks, stable-sort by `start`
/// 5. Clip to the display range
#[derive(Debug, Clone)]
pub struct Aggregator<C, T> {
    calendar: C,
    tasks: T,
    container_timeout: Duration,
}

impl<C: ScheduleSource, T: ScheduleSource> Aggregator<C, T> {
    pub fn new(calendar: C, tasks: T, config: &AgendaConfig) -> Self {
        Self {
            calendar,
            tasks,
            container_timeout: Duration::from_secs(config.container_timeout_seconds),
        }
    }

    /// Collect the ordered, windowed schedule for `mode` as seen at `now`.
    ///
    /// `zone` anchors date-only provider values at local midnight.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::Auth`] only when the calendar provider rejects
    /// the credential while listing calendars. All other failures degrade to
    /// missing items.
    pub async fn aggregate(
        &self,
        credential: &str,
        mode: Mode,
        now: DateTime<Utc>,
        zone: Tz,
    ) -> Result<Vec<UnifiedItem>, AgendaError> {
        let window = Window::for_mode(mode, now, zone);

        let (events, tasks) = tokio::join!(
            collect_source(&self.calendar, credential, &window, self.container_timeout),
            collect_source(&self.tasks, credential, &window, self.container_timeout),
        );

        let events = match events {
            Ok(events) => events,
            Err(err) if err.is_auth() => {
                tracing::warn!(error = %err, "calendar credential rejected");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(error = %err, "calendar source unavailable, continuing without events");
                Vec::new()
            }
        };
        let tasks = tasks.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "task source unavailable, continuing without tasks");
            Vec::new()
        });

        let fetched = events.len().saturating_add(tasks.len());
        let items = clip(merge(events, tasks), &window);
        tracing::debug!(%mode, fetched, shown = items.len(), "schedule aggregated");
        Ok(items)
    }
}
