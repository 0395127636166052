//! Fetch and display windows.
//!
//! Providers are queried over a range wider than the one shown to the user
//! so items near a day boundary survive provider-side timezone conversion.
//! The display range is the authoritative filter.

use crate::types::Mode;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;

/// Time bounds for one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Lower bound sent to providers.
    pub fetch_from: DateTime<Utc>,
    /// Upper bound sent to providers.
    pub fetch_to: DateTime<Utc>,
    /// Inclusive lower bound of what is shown.
    pub display_from: DateTime<Utc>,
    /// Inclusive upper bound of what is shown.
    pub display_to: DateTime<Utc>,
    /// Zone used to anchor date-only provider values at local midnight.
    pub zone: Tz,
}

impl Window {
    /// Build the window for `mode` as seen at `now`.
    ///
    /// `fetch_from` is UTC midnight of `now`, so it never lies after
    /// `display_from`, and the 2/9 day fetch spans always cover the 24h/7d
    /// display spans.
    pub fn for_mode(mode: Mode, now: DateTime<Utc>, zone: Tz) -> Self {
        let fetch_from = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let (fetch_days, display_span) = match mode {
            Mode::Daily => (2, Duration::hours(24)),
            Mode::Weekly => (9, Duration::days(7)),
        };
        Self {
            fetch_from,
            fetch_to: fetch_from + Duration::days(fetch_days),
            display_from: now,
            display_to: now + display_span,
            zone,
        }
    }

    /// Whether `instant` falls inside the display range, both ends inclusive.
    pub fn displays(&self, instant: DateTime<Utc>) -> bool {
        self.display_from <= instant && instant <= self.display_to
    }
}
