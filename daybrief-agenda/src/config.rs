//! Agenda configuration with sensible defaults.
//!
//! [`AgendaConfig`] controls provider endpoints, timeouts and pagination
//! limits. Base URLs are overridable so adapters can run against a local
//! mock server.

use crate::error::AgendaError;
use serde::{Deserialize, Serialize};

/// Google Calendar v3 REST root.
pub const GOOGLE_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Google Tasks v1 REST root.
pub const GOOGLE_TASKS_BASE_URL: &str = "https://tasks.googleapis.com/tasks/v1";

/// Configuration for schedule collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaConfig {
    /// Root URL of the calendar provider.
    pub calendar_base_url: String,
    /// Root URL of the task provider.
    pub tasks_base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Upper bound for fetching one container, pagination included.
    pub container_timeout_seconds: u64,
    /// Maximum pages followed per container.
    pub max_pages: usize,
    /// Page size requested from the provider.
    pub page_size: u32,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            calendar_base_url: GOOGLE_CALENDAR_BASE_URL.to_owned(),
            tasks_base_url: GOOGLE_TASKS_BASE_URL.to_owned(),
            request_timeout_seconds: 8,
            container_timeout_seconds: 10,
            max_pages: 5,
            page_size: 250,
        }
    }
}

impl AgendaConfig {
    /// Validates this configuration, returning an error for the first
    /// invalid field.
    pub fn validate(&self) -> Result<(), AgendaError> {
        if self.request_timeout_seconds == 0 {
            return Err(AgendaError::Config(
                "request_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.container_timeout_seconds == 0 {
            return Err(AgendaError::Config(
                "container_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(AgendaError::Config("max_pages must be greater than 0".into()));
        }
        if self.page_size == 0 {
            return Err(AgendaError::Config("page_size must be greater than 0".into()));
        }
        for (name, value) in [
            ("calendar_base_url", &self.calendar_base_url),
            ("tasks_base_url", &self.tasks_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AgendaError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }
}
