//! Core types: unified schedule items, digest modes and containers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a [`UnifiedItem`] was built from.
///
/// Tasks carry no end and are always all-day, so those fields only exist on
/// the event variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    /// A calendar event.
    Event {
        /// End instant, when the provider supplied one.
        end: Option<DateTime<Utc>>,
        /// The provider start had no time-of-day component.
        all_day: bool,
    },
    /// A task with a due date.
    Task,
}

/// A calendar event or a task, normalised onto a common ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedItem {
    /// Display title.
    pub title: String,
    /// Ordering key. Date-only values hold local midnight of that date.
    pub start: DateTime<Utc>,
    /// Event or task, with the kind-specific fields.
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl UnifiedItem {
    /// Build a timed or all-day event.
    pub fn event(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        all_day: bool,
    ) -> Self {
        Self {
            title: title.into(),
            start,
            kind: ItemKind::Event { end, all_day },
        }
    }

    /// Build a task due at `due`.
    pub fn task(title: impl Into<String>, due: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            start: due,
            kind: ItemKind::Task,
        }
    }

    /// End instant; always `None` for tasks.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        match self.kind {
            ItemKind::Event { end, .. } => end,
            ItemKind::Task => None,
        }
    }

    /// Whether the item renders without a time of day; always `true` for tasks.
    pub fn all_day(&self) -> bool {
        match self.kind {
            ItemKind::Event { all_day, .. } => all_day,
            ItemKind::Task => true,
        }
    }

    pub fn is_task(&self) -> bool {
        matches!(self.kind, ItemKind::Task)
    }
}

/// Digest flavour: the next 24 hours or the next 7 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Daily,
    Weekly,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(format!("unknown mode `{other}`")),
        }
    }
}

/// Which source a container or item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Calendar,
    Tasks,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calendar => f.write_str("calendar"),
            Self::Tasks => f.write_str("tasks"),
        }
    }
}

/// A calendar or task list: the unit of fan-out and failure containment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Provider identifier, used in request paths.
    pub id: String,
    /// Human-readable name, for logs only.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).single().expect("valid")
    }

    #[test]
    fn task_has_no_end_and_is_all_day() {
        let task = UnifiedItem::task("pay rent", at(18, 0));
        assert!(task.is_task());
        assert!(task.end().is_none());
        assert!(task.all_day());
    }

    #[test]
    fn event_exposes_its_fields() {
        let ev = UnifiedItem::event("workout", at(7, 0), Some(at(8, 0)), false);
        assert!(!ev.is_task());
        assert_eq!(ev.end(), Some(at(8, 0)));
        assert!(!ev.all_day());
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(" Daily ".parse::<Mode>(), Ok(Mode::Daily));
        assert_eq!("WEEKLY".parse::<Mode>(), Ok(Mode::Weekly));
        assert!("monthly".parse::<Mode>().is_err());
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::Daily.to_string(), "daily");
        assert_eq!(Mode::Weekly.to_string(), "weekly");
    }

    #[test]
    fn item_serializes_with_flat_kind_tag() {
        let task = UnifiedItem::task("pay rent", at(18, 0));
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["kind"], "task");
        assert_eq!(json["title"], "pay rent");
    }
}
