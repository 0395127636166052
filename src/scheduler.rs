//! Automatic digest delivery.
//!
//! Every tick the scheduler walks all profiles, converts `now` into each
//! profile's zone and fires the daily and weekly digests whose local slot has
//! arrived. A `(user, mode, local date)` triple fires at most once per
//! process.

use crate::config::ScheduleConfig;
use crate::router::{Action, RequestRouter, Trigger};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use daybrief_agenda::Mode;
use std::collections::HashSet;

/// How long after its slot a digest may still be sent, covering missed
/// ticks and short restarts.
const CATCH_UP_MINUTES: i64 = 60;

/// A local wall-clock delivery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub mode: Mode,
    /// `None` fires every day.
    pub weekday: Option<Weekday>,
    pub hour: u32,
    pub minute: u32,
}

impl Slot {
    fn is_due(&self, local: &DateTime<Tz>) -> bool {
        if self.weekday.is_some_and(|day| day != local.weekday()) {
            return false;
        }
        let now_minutes = i64::from(local.hour() * 60 + local.minute());
        let slot_minutes = i64::from(self.hour * 60 + self.minute);
        let elapsed = now_minutes - slot_minutes;
        (0..CATCH_UP_MINUTES).contains(&elapsed)
    }
}

/// The configured daily and weekly slots.
pub fn slots(config: &ScheduleConfig) -> [Slot; 2] {
    [
        Slot {
            mode: Mode::Daily,
            weekday: None,
            hour: config.daily_hour,
            minute: config.daily_minute,
        },
        Slot {
            mode: Mode::Weekly,
            weekday: Some(config.weekly_day),
            hour: config.weekly_hour,
            minute: config.weekly_minute,
        },
    ]
}

/// Modes whose slot is open at `now` in `zone`.
pub fn due_modes(config: &ScheduleConfig, now: DateTime<Utc>, zone: Tz) -> Vec<Mode> {
    let local = now.with_timezone(&zone);
    slots(config)
        .iter()
        .filter(|slot| slot.is_due(&local))
        .map(|slot| slot.mode)
        .collect()
}

/// Fires scheduled digests through the [`RequestRouter`].
pub struct DigestScheduler {
    router: RequestRouter,
    config: ScheduleConfig,
    default_zone: Tz,
    fired: HashSet<(String, Mode, NaiveDate)>,
}

impl DigestScheduler {
    pub fn new(router: RequestRouter, config: ScheduleConfig, default_zone: Tz) -> Self {
        Self {
            router,
            config,
            default_zone,
            fired: HashSet::new(),
        }
    }

    /// Tick forever at the configured interval.
    pub async fn run(mut self) {
        let period = std::time::Duration::from_secs(self.config.tick_seconds.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            daily = %format!("{:02}:{:02}", self.config.daily_hour, self.config.daily_minute),
            weekly = %format!(
                "{} {:02}:{:02}",
                self.config.weekly_day, self.config.weekly_hour, self.config.weekly_minute
            ),
            "digest scheduler started"
        );
        loop {
            interval.tick().await;
            self.tick(Utc::now()).await;
        }
    }

    /// Fire every digest due at `now`. Returns how many were attempted.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now.date_naive() - Duration::days(2);
        self.fired.retain(|(_, _, date)| *date >= cutoff);

        let profiles = match self.router.lookup(|store| store.all()).await {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(error = %e, "scheduler could not read profiles, skipping tick");
                return 0;
            }
        };

        let mut attempted = 0usize;
        for profile in profiles {
            if profile.destination().is_none() || profile.credential().is_none() {
                continue;
            }
            let zone = profile.zone(self.default_zone);
            let local_date = now.with_timezone(&zone).date_naive();

            for mode in due_modes(&self.config, now, zone) {
                if !self.fired.insert((profile.user_id.clone(), mode, local_date)) {
                    continue;
                }
                attempted = attempted.saturating_add(1);
                let trigger = Trigger::Direct {
                    action: Action::from(mode),
                    user_id: profile.user_id.clone(),
                };
                if let Err(e) = self.router.handle(trigger, now).await {
                    tracing::warn!(
                        user_id = %profile.user_id,
                        %mode,
                        category = e.category(),
                        "scheduled digest failed"
                    );
                }
            }
        }
        attempted
    }
}
