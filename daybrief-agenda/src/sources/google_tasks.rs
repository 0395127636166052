//! Google Tasks v1 source.
//!
//! Only tasks with a due date are returned; undated tasks cannot be ordered
//! against events.

use crate::config::AgendaConfig;
use crate::error::AgendaError;
use crate::http::{build_client, get_json};
use crate::source::ScheduleSource;
use crate::types::{Container, SourceKind, UnifiedItem};
use crate::window::Window;
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use super::{endpoint, local_midnight, parse_instant, title_or_placeholder};

/// The Tasks API caps `maxResults` at 100.
const MAX_TASKS_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskListsPage {
    #[serde(default)]
    items: Vec<TaskListEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskListEntry {
    id: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TasksPage {
    #[serde(default)]
    items: Vec<RawTask>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTask {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    due: Option<String>,
}

/// Map one provider task. Returns `Ok(None)` for tasks without a due date.
///
/// The provider stores due dates without a time and reports them as UTC
/// midnight; those are re-anchored to local midnight of the same date. Any
/// other due time is kept as the exact instant.
pub(crate) fn map_task(raw: RawTask, zone: Tz) -> Result<Option<UnifiedItem>, AgendaError> {
    let Some(due) = raw.due.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let due = anchor_due(parse_instant(due)?, zone);
    Ok(Some(UnifiedItem::task(title_or_placeholder(raw.title), due)))
}

fn anchor_due(due: DateTime<Utc>, zone: Tz) -> DateTime<Utc> {
    if due.num_seconds_from_midnight() == 0 && due.nanosecond() == 0 {
        local_midnight(due.date_naive(), zone)
    } else {
        due
    }
}

/// Task source backed by the Google Tasks REST API.
#[derive(Debug, Clone)]
pub struct GoogleTasksSource {
    client: reqwest::Client,
    config: AgendaConfig,
}

impl GoogleTasksSource {
    /// # Errors
    ///
    /// Returns [`AgendaError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AgendaConfig) -> Result<Self, AgendaError> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
        })
    }

    fn page_size(&self) -> String {
        self.config.page_size.min(MAX_TASKS_PAGE_SIZE).to_string()
    }
}

impl ScheduleSource for GoogleTasksSource {
    async fn list_containers(&self, credential: &str) -> Result<Vec<Container>, AgendaError> {
        let mut containers = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.config.max_pages {
            let mut url = endpoint(&self.config.tasks_base_url, &["users", "@me", "lists"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("maxResults", &self.page_size());
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: TaskListsPage = get_json(&self.client, url, credential).await?;
            containers.extend(page.items.into_iter().map(|entry| Container {
                name: entry.title.unwrap_or_else(|| entry.id.clone()),
                id: entry.id,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = containers.len(), "task lists listed");
        Ok(containers)
    }

    async fn list_items(
        &self,
        credential: &str,
        container: &Container,
        window: &Window,
    ) -> Result<Vec<UnifiedItem>, AgendaError> {
        let due_min = window.fetch_from.to_rfc3339_opts(SecondsFormat::Secs, true);
        let due_max = window.fetch_to.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.config.max_pages {
            let mut url = endpoint(
                &self.config.tasks_base_url,
                &["lists", &container.id, "tasks"],
            )?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("dueMin", &due_min)
                    .append_pair("dueMax", &due_max)
                    .append_pair("showCompleted", "false")
                    .append_pair("maxResults", &self.page_size());
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: TasksPage = get_json(&self.client, url, credential).await?;
            for raw in page.items {
                match map_task(raw, window.zone) {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(list = %container.id, error = %err, "skipping malformed task");
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
        SourceKind::Tasks
    }
}
