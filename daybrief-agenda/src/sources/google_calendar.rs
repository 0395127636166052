//! Google Calendar v3 source.
//!
//! Lists every calendar on the account (`users/me/calendarList`) and reads
//! events with `singleEvents=true` so the provider expands recurrences.

use crate::config::AgendaConfig;
use crate::error::AgendaError;
use crate::http::{build_client, get_json};
use crate::source::ScheduleSource;
use crate::types::{Container, SourceKind, UnifiedItem};
use crate::window::Window;
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use super::{endpoint, local_midnight, parse_date, parse_instant, title_or_placeholder};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListPage {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CalendarListEntry {
    id: String,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<RawEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEvent {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
    #[serde(default)]
    end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl EventTime {
    /// Resolve to an instant plus whether the value was date-only.
    fn resolve(&self, zone: Tz) -> Result<(DateTime<Utc>, bool), AgendaError> {
        if let Some(ref date_time) = self.date_time {
            return Ok((parse_instant(date_time)?, false));
        }
        if let Some(ref date) = self.date {
            return Ok((local_midnight(parse_date(date)?, zone), true));
        }
        Err(AgendaError::Parse("event time has neither dateTime nor date".into()))
    }
}

/// Map one provider event. Returns `Ok(None)` for cancelled occurrences.
pub(crate) fn map_event(raw: RawEvent, zone: Tz) -> Result<Option<UnifiedItem>, AgendaError> {
    if raw.status.as_deref() == Some("cancelled") {
        return Ok(None);
    }
    let start = raw
        .start
        .ok_or_else(|| AgendaError::Parse("event without start".into()))?;
    let (start, all_day) = start.resolve(zone)?;
    let end = match raw.end {
        Some(end) => Some(end.resolve(zone)?.0),
        None => None,
    };
    Ok(Some(UnifiedItem::event(
        title_or_placeholder(raw.summary),
        start,
        end,
        all_day,
    )))
}

/// Calendar source backed by the Google Calendar REST API.
#[derive(Debug, Clone)]
pub struct GoogleCalendarSource {
    client: reqwest::Client,
    config: AgendaConfig,
}

impl GoogleCalendarSource {
    /// # Errors
    ///
    /// Returns [`AgendaError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AgendaConfig) -> Result<Self, AgendaError> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
        })
    }
}

impl ScheduleSource for GoogleCalendarSource {
    async fn list_containers(&self, credential: &str) -> Result<Vec<Container>, AgendaError> {
        let mut containers = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.config.max_pages {
            let mut url = endpoint(
                &self.config.calendar_base_url,
                &["users", "me", "calendarList"],
            )?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("maxResults", &self.config.page_size.to_string());
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: CalendarListPage = get_json(&self.client, url, credential).await?;
            containers.extend(page.items.into_iter().map(|entry| Container {
                name: entry.summary.unwrap_or_else(|| entry.id.clone()),
                id: entry.id,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = containers.len(), "calendars listed");
        Ok(containers)
    }

    async fn list_items(
        &self,
        credential: &str,
        container: &Container,
        window: &Window,
    ) -> Result<Vec<UnifiedItem>, AgendaError> {
        let time_min = window.fetch_from.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = window.fetch_to.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.config.max_pages {
            let mut url = endpoint(
                &self.config.calendar_base_url,
                &["calendars", &container.id, "events"],
            )?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("timeMin", &time_min)
                    .append_pair("timeMax", &time_max)
                    .append_pair("singleEvents", "true")
                    .append_pair("orderBy", "startTime")
                    .append_pair("maxResults", &self.config.page_size.to_string());
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: EventsPage = get_json(&self.client, url, credential).await?;
            for raw in page.items {
                match map_event(raw, window.zone) {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(calendar = %container.id, error = %err, "skipping malformed event");
                    }
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Calendar
    }
}
