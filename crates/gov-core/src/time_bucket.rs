// SPDX-License-Identifier: Apache-2.0

//! Hourly/daily/monthly time-bucket helpers shared by the rollup engine,
//! the scheduler, and the query service.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A UTC time bucket at hour, day, or month granularity.
///
/// The canonical string form is what's persisted in warehouse rows:
/// hourly `2026-07-28T14:00:00Z`, daily `2026-07-28`, monthly `2026-07`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    /// Hourly bucket, truncated to the hour.
    Hourly(DateTime<Utc>),
    /// Daily bucket, truncated to midnight UTC.
    Daily(DateTime<Utc>),
    /// Monthly bucket, truncated to the first of the month.
    Monthly(DateTime<Utc>),
}

impl TimeBucket {
    /// Truncates `at` to the start of its hour.
    #[must_use]
    pub fn hourly(at: DateTime<Utc>) -> Self {
        TimeBucket::Hourly(
            at.with_minute(0)
                .and_then(|d| d.with_second(0))
                .and_then(|d| d.with_nanosecond(0))
                .unwrap_or(at),
        )
    }

    /// Truncates `at` to the start of its UTC day.
    #[must_use]
    pub fn daily(at: DateTime<Utc>) -> Self {
        TimeBucket::Daily(at.date_naive().and_hms_opt(0, 0, 0).map_or(at, |naive| {
            Utc.from_utc_datetime(&naive)
        }))
    }

    /// Truncates `at` to the first of its UTC month.
    #[must_use]
    pub fn monthly(at: DateTime<Utc>) -> Self {
        let naive = at
            .date_naive()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0));
        TimeBucket::Monthly(naive.map_or(at, |naive| Utc.from_utc_datetime(&naive)))
    }

    /// The start instant of this bucket.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            TimeBucket::Hourly(t) | TimeBucket::Daily(t) | TimeBucket::Monthly(t) => *t,
        }
    }

    /// The exclusive end instant of this bucket.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        match self {
            TimeBucket::Hourly(t) => *t + Duration::hours(1),
            TimeBucket::Daily(t) => *t + Duration::days(1),
            TimeBucket::Monthly(t) => {
                let next_month = if t.month() == 12 {
                    Utc.with_ymd_and_hms(t.year() + 1, 1, 1, 0, 0, 0)
                } else {
                    Utc.with_ymd_and_hms(t.year(), t.month() + 1, 1, 0, 0, 0)
                };
                next_month.single().unwrap_or(*t)
            }
        }
    }

    /// Canonical persisted string form.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            TimeBucket::Hourly(t) => t.format("%Y-%m-%dT%H:00:00Z").to_string(),
            TimeBucket::Daily(t) => t.format("%Y-%m-%d").to_string(),
            TimeBucket::Monthly(t) => t.format("%Y-%m").to_string(),
        }
    }

    /// The next bucket of the same granularity.
    #[must_use]
    pub fn next(&self) -> Self {
        match self {
            TimeBucket::Hourly(t) => TimeBucket::hourly(*t + Duration::hours(1)),
            TimeBucket::Daily(t) => TimeBucket::daily(*t + Duration::days(1)),
            TimeBucket::Monthly(_) => TimeBucket::monthly(self.end()),
        }
    }
}

/// Floors `at` to the most recent fixed-size boundary of `window_minutes`
/// minutes since UTC midnight — a configurable-granularity analogue of
/// [`TimeBucket::hourly`], used to key the rolling error-budget window so
/// every message observed within the same wall-clock window agrees on the
/// same `window_start` rather than each call's `now` sliding the boundary.
#[must_use]
pub fn floor_to_window(at: DateTime<Utc>, window_minutes: i64) -> DateTime<Utc> {
    let window_minutes = window_minutes.max(1);
    let day_start = at
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map_or(at, |naive| Utc.from_utc_datetime(&naive));
    let minutes_since_midnight = (at - day_start).num_minutes();
    let floored_minutes = (minutes_since_midnight / window_minutes) * window_minutes;
    day_start + Duration::minutes(floored_minutes)
}

/// Windowed counter identifier, e.g. `hourly` / `daily`, used in
/// `CTR:{feature_key}:{resource}:{window}` KVCS keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterWindow {
    /// A rolling or bucketed hourly window.
    Hourly,
    /// A rolling or bucketed daily window.
    Daily,
}

impl CounterWindow {
    /// The window's duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            CounterWindow::Hourly => Duration::hours(1),
            CounterWindow::Daily => Duration::days(1),
        }
    }

    /// The wire name used in KVCS keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterWindow::Hourly => "hourly",
            CounterWindow::Daily => "daily",
        }
    }
}
