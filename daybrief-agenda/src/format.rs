//! Digest rendering.
//!
//! Output is plain text suitable for chat delivery (WhatsApp renders
//! `*bold*`). Rendering is deterministic for a given item list, mode, zone
//! and `now`.

use crate::types::{ItemKind, Mode, UnifiedItem};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::fmt::Write as _;

pub const DAILY_HEADER: &str = "📅 Today's Schedule";
pub const WEEKLY_HEADER: &str = "🗓️ Weekly Overview";
pub const DAILY_EMPTY: &str =
    "📅 Nothing on your schedule for the next 24 hours. Enjoy your free time!";
pub const WEEKLY_EMPTY: &str = "🗓️ No events or tasks found for the coming week.";
pub const EVENT_MARKER: &str = "📌";
pub const TASK_MARKER: &str = "✅";
pub const ALL_DAY: &str = "All Day";

/// Render `items` (already ordered and clipped) for delivery.
///
/// `now` determines "today" in `zone` for the daily date prefix.
pub fn format_schedule(items: &[UnifiedItem], mode: Mode, zone: Tz, now: DateTime<Utc>) -> String {
    if items.is_empty() {
        return match mode {
            Mode::Daily => DAILY_EMPTY.to_owned(),
            Mode::Weekly => WEEKLY_EMPTY.to_owned(),
        };
    }

    match mode {
        Mode::Daily => format_daily(items, zone, now),
        Mode::Weekly => format_weekly(items, zone),
    }
}

fn format_daily(items: &[UnifiedItem], zone: Tz, now: DateTime<Utc>) -> String {
    let today = local_date(now, zone);
    let mut out = format!("{DAILY_HEADER}\n");
    for item in items {
        let date = local_date(item.start, zone);
        let prefix = if date == today {
            String::new()
        } else {
            format!("{} ", item.start.with_timezone(&zone).format("%a %d/%m"))
        };
        let _ = write!(
            out,
            "\n{} {prefix}{} {}",
            marker(item),
            time_segment(item, zone),
            item.title
        );
    }
    out
}

fn format_weekly(items: &[UnifiedItem], zone: Tz) -> String {
    let mut out = format!("{WEEKLY_HEADER}\n");
    let mut seen_days: HashSet<NaiveDate> = HashSet::new();
    for item in items {
        let local = item.start.with_timezone(&zone);
        if seen_days.insert(local.date_naive()) {
            let _ = write!(out, "\n*{}*", local.format("%A %d/%m"));
        }
        let _ = write!(
            out,
            "\n{} {} {}",
            marker(item),
            time_segment(item, zone),
            item.title
        );
    }
    out
}

fn marker(item: &UnifiedItem) -> &'static str {
    match item.kind {
        ItemKind::Event { .. } => EVENT_MARKER,
        ItemKind::Task => TASK_MARKER,
    }
}

/// `All Day`, `HH:MM`, or `HH:MM - HH:MM` in `zone`.
pub fn time_segment(item: &UnifiedItem, zone: Tz) -> String {
    match item.kind {
        ItemKind::Task | ItemKind::Event { all_day: true, .. } => ALL_DAY.to_owned(),
        ItemKind::Event { end: None, .. } => clock(item.start, zone),
        ItemKind::Event { end: Some(end), .. } => {
            format!("{} - {}", clock(item.start, zone), clock(end, zone))
        }
    }
}

fn clock(instant: DateTime<Utc>, zone: Tz) -> String {
    instant.with_timezone(&zone).format("%H:%M").to_string()
}

fn local_date(instant: DateTime<Utc>, zone: Tz) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}
