//! Integration tests for the aggregation pipeline.
//!
//! Sources here are in-memory, keyed by container id, so ordering, window
//! and failure-containment rules can be checked without a network.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use daybrief_agenda::format::{ALL_DAY, EVENT_MARKER, TASK_MARKER};
use daybrief_agenda::{
    format_schedule, AgendaConfig, AgendaError, Aggregator, Container, Mode, ScheduleSource,
    SourceKind, UnifiedItem, Window,
};

/// One container's scripted outcome.
#[derive(Clone)]
enum Fetch {
    Items(Vec<UnifiedItem>),
    Fails,
}

struct MemorySource {
    kind: SourceKind,
    listing: Result<Vec<(&'static str, Fetch)>, fn() -> AgendaError>,
}

impl MemorySource {
    fn new(kind: SourceKind, containers: Vec<(&'static str, Fetch)>) -> Self {
        Self {
            kind,
            listing: Ok(containers),
        }
    }

    fn broken(kind: SourceKind, error: fn() -> AgendaError) -> Self {
        Self {
            kind,
            listing: Err(error),
        }
    }
}

impl ScheduleSource for MemorySource {
    async fn list_containers(&self, _credential: &str) -> Result<Vec<Container>, AgendaError> {
        match &self.listing {
            Ok(containers) => Ok(containers
                .iter()
                .map(|(id, _)| Container {
                    id: (*id).to_owned(),
                    name: (*id).to_owned(),
                })
                .collect()),
            Err(make) => Err(make()),
        }
    }

    async fn list_items(
        &self,
        _credential: &str,
        container: &Container,
        _window: &Window,
    ) -> Result<Vec<UnifiedItem>, AgendaError> {
        let Ok(containers) = &self.listing else {
            return Err(AgendaError::Http("listing failed".into()));
        };
        match containers.iter().find(|(id, _)| *id == container.id) {
            Some((_, Fetch::Items(items))) => Ok(items.clone()),
            Some((_, Fetch::Fails)) => Err(AgendaError::Http("500 from provider".into())),
            None => Err(AgendaError::Parse("unknown container".into())),
        }
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).single().expect("valid")
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).single().expect("valid")
}

fn event(title: &str, start: DateTime<Utc>) -> UnifiedItem {
    UnifiedItem::event(title, start, None, false)
}

fn aggregator(
    calendars: MemorySource,
    tasks: MemorySource,
) -> Aggregator<MemorySource, MemorySource> {
    Aggregator::new(calendars, tasks, &AgendaConfig::default())
}

fn titles(items: &[UnifiedItem]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}

#[tokio::test]
async fn output_is_sorted_with_events_before_tasks_on_ties() {
    let nine = at(9, 0);
    let calendars = MemorySource::new(
        SourceKind::Calendar,
        vec![
            ("work", Fetch::Items(vec![event("w1", at(11, 0)), event("w2", nine)])),
            ("home", Fetch::Items(vec![event("h1", nine), event("h2", at(7, 0))])),
        ],
    );
    let tasks = MemorySource::new(
        SourceKind::Tasks,
        vec![(
            "inbox",
            Fetch::Items(vec![UnifiedItem::task("t1", nine), UnifiedItem::task("t2", at(8, 0))]),
        )],
    );

    let items = aggregator(calendars, tasks)
        .aggregate("token", Mode::Daily, now(), Tz::UTC)
        .await
        .expect("aggregate");

    for pair in items.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
    // At 09:00: work's w2, then home's h1 (container order), then the task.
    assert_eq!(titles(&items), vec!["h2", "t2", "w2", "h1", "t1", "w1"]);
}

#[tokio::test]
async fn daily_window_boundaries() {
    let calendars = MemorySource::new(
        SourceKind::Calendar,
        vec![(
            "primary",
            Fetch::Items(vec![
                event("one second early", now() - Duration::seconds(1)),
                event("inside", now() + Duration::hours(23) + Duration::minutes(59)),
                event("one second late", now() + Duration::hours(24) + Duration::seconds(1)),
            ]),
        )],
    );
    let tasks = MemorySource::new(SourceKind::Tasks, vec![]);

    let items = aggregator(calendars, tasks)
        .aggregate("token", Mode::Daily, now(), Tz::UTC)
        .await
        .expect("aggregate");

    assert_eq!(titles(&items), vec!["inside"]);
}

#[tokio::test]
async fn weekly_window_boundaries() {
    let week = Duration::days(7);
    let calendars = MemorySource::new(
        SourceKind::Calendar,
        vec![(
            "primary",
            Fetch::Items(vec![
                event("one second early", now() - Duration::seconds(1)),
                event("day five", now() + Duration::days(5)),
                event("last minute", now() + week - Duration::minutes(1)),
                event("one second late", now() + week + Duration::seconds(1)),
            ]),
        )],
    );
    let tasks = MemorySource::new(SourceKind::Tasks, vec![]);

    let items = aggregator(calendars, tasks)
        .aggregate("token", Mode::Weekly, now(), Tz::UTC)
        .await
        .expect("aggregate");

    assert_eq!(titles(&items), vec!["day five", "last minute"]);
}

#[tokio::test]
async fn one_failing_calendar_does_not_hide_the_others() {
    let calendars = MemorySource::new(
        SourceKind::Calendar,
        vec![
            ("personal", Fetch::Items(vec![event("run", at(7, 0))])),
            ("shared", Fetch::Fails),
            ("work", Fetch::Items(vec![event("standup", at(9, 0))])),
        ],
    );
    let tasks = MemorySource::new(SourceKind::Tasks, vec![]);

    let items = aggregator(calendars, tasks)
        .aggregate("token", Mode::Daily, now(), Tz::UTC)
        .await
        .expect("aggregate");

    assert_eq!(titles(&items), vec!["run", "standup"]);
}

#[tokio::test]
async fn task_subsystem_outage_is_absorbed() {
    let calendars = MemorySource::new(
        SourceKind::Calendar,
        vec![("personal", Fetch::Items(vec![event("run", at(7, 0))]))],
    );
    let tasks = MemorySource::broken(SourceKind::Tasks, || {
        AgendaError::Http("tasks API disabled".into())
    });

    let items = aggregator(calendars, tasks)
        .aggregate("token", Mode::Daily, now(), Tz::UTC)
        .await
        .expect("aggregate");

    assert_eq!(titles(&items), vec!["run"]);
}

#[tokio::test]
async fn rejected_credential_differs_from_empty_schedule() {
    let expired = aggregator(
        MemorySource::broken(SourceKind::Calendar, || AgendaError::Auth("401".into())),
        MemorySource::new(SourceKind::Tasks, vec![]),
    )
    .aggregate("token", Mode::Daily, now(), Tz::UTC)
    .await;

    let empty = aggregator(
        MemorySource::new(SourceKind::Calendar, vec![("primary", Fetch::Items(vec![]))]),
        MemorySource::new(SourceKind::Tasks, vec![]),
    )
    .aggregate("token", Mode::Daily, now(), Tz::UTC)
    .await;

    assert!(matches!(expired, Err(AgendaError::Auth(_))));
    assert!(matches!(empty, Ok(ref items) if items.is_empty()));
}

#[tokio::test]
async fn morning_digest_end_to_end() {
    let calendars = MemorySource::new(
        SourceKind::Calendar,
        vec![
            (
                "personal",
                Fetch::Items(vec![UnifiedItem::event("workout", at(7, 0), Some(at(8, 0)), false)]),
            ),
            (
                "work",
                Fetch::Items(vec![UnifiedItem::event("meeting", at(9, 30), Some(at(11, 0)), false)]),
            ),
        ],
    );
    let tasks = MemorySource::new(
        SourceKind::Tasks,
        vec![("chores", Fetch::Items(vec![UnifiedItem::task("pay rent", at(18, 0))]))],
    );

    let items = aggregator(calendars, tasks)
        .aggregate("token", Mode::Daily, now(), Tz::UTC)
        .await
        .expect("aggregate");
    assert_eq!(titles(&items), vec!["workout", "meeting", "pay rent"]);

    let text = format_schedule(&items, Mode::Daily, Tz::UTC, now());
    let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], format!("{EVENT_MARKER} 07:00 - 08:00 workout"));
    assert_eq!(lines[2], format!("{EVENT_MARKER} 09:30 - 11:00 meeting"));
    assert_eq!(lines[3], format!("{TASK_MARKER} {ALL_DAY} pay rent"));
}
