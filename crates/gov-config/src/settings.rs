// SPDX-License-Identifier: Apache-2.0

//! The canonical platform settings, with the defaults used when no
//! deployment configuration overrides them.
//!
//! Field names match the `lowercase_snake` canonical setting keys one-to-one
//! so that [`PlatformSettings`] can be (de)serialized directly as the
//! `CONFIG:SETTINGS:*` KVCS cache payload.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use gov_core::ResourceTag;

/// Platform-wide tunable settings.
///
/// Two values are explicitly deployment-tunable: [`PlatformSettings::hard_limit_multiplier`]
/// and [`PlatformSettings::max_reasonable_delta`]. Defaults are documented
/// alongside each field and the chosen starting values are recorded in
/// `DESIGN.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PlatformSettings {
    /// Soft budget limit fraction before a warning is surfaced (not a trip).
    #[serde(default = "default_budget_soft_limit")]
    pub budget_soft_limit: f64,
    /// Utilization fraction at which a budget warning alert fires.
    #[serde(default = "default_budget_warning_threshold")]
    pub budget_warning_threshold: f64,
    /// Utilization fraction at which a budget critical alert fires.
    #[serde(default = "default_budget_critical_threshold")]
    pub budget_critical_threshold: f64,
    /// Cost-budget percent-of-limit at which a warning alert fires.
    #[serde(default = "default_alert_warning_pct")]
    pub alert_warning_pct: f64,
    /// Cost-budget percent-of-limit at which a critical alert fires.
    #[serde(default = "default_alert_critical_pct")]
    pub alert_critical_pct: f64,
    /// BCU utilization percent at which a warning is surfaced.
    #[serde(default = "default_utilization_warning_pct")]
    pub utilization_warning_pct: f64,
    /// BCU utilization percent at which a critical alert is surfaced.
    #[serde(default = "default_utilization_critical_pct")]
    pub utilization_critical_pct: f64,
    /// `d1_writes_24h / d1_write_limit` ratio below which sampling mode is FULL.
    #[serde(default = "default_sampling_full_threshold")]
    pub sampling_full_threshold: f64,
    /// Ratio below which sampling mode is HALF (above FULL threshold).
    #[serde(default = "default_sampling_half_threshold")]
    pub sampling_half_threshold: f64,
    /// Ratio below which sampling mode is QUARTER (above HALF threshold); at
    /// or above this ratio sampling mode is MINIMAL.
    #[serde(default = "default_sampling_quarter_threshold")]
    pub sampling_quarter_threshold: f64,
    /// Seconds after a STOP trip before the auto-reset sweep clears it.
    #[serde(default = "default_cb_auto_reset_seconds")]
    pub cb_auto_reset_seconds: i64,
    /// Minimum seconds between consecutive trips before consecutive-trip
    /// counting resets (used to detect flapping).
    #[serde(default = "default_cb_cooldown_seconds")]
    pub cb_cooldown_seconds: i64,
    /// Consecutive trips within the cooldown window after which auto-reset
    /// is suppressed (the feature requires manual intervention).
    #[serde(default = "default_cb_max_consecutive_trips")]
    pub cb_max_consecutive_trips: u32,
    /// Batch error rate at/above which the Adaptive Error Sampler engages
    /// (`TRIGGER_THRESHOLD`) and P0 escalation considers firing.
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate_threshold: f64,
    /// Sliding window width, in minutes, for error-rate alerting (`ERROR_WINDOW_MINUTES`).
    #[serde(default = "default_error_rate_window_minutes")]
    pub error_rate_window_minutes: i64,
    /// Minimum total requests in the window before P0 error-rate escalation can fire.
    #[serde(default = "default_error_rate_min_requests")]
    pub error_rate_min_requests: u64,
    /// Daily relational-warehouse write budget used by the scheduler's sampling-mode gate.
    #[serde(default = "default_d1_write_limit")]
    pub d1_write_limit: u64,
    /// Daily durable-object GB-seconds budget.
    #[serde(default = "default_do_gb_seconds_daily_limit")]
    pub do_gb_seconds_daily_limit: u64,

    /// Hard-limit multiplier applied to a budget before tripping STOP
    /// (reserves warning headroom). Deployment-tunable; ×1.5 by default.
    #[serde(default = "default_hard_limit_multiplier")]
    pub hard_limit_multiplier: f64,
    /// Adaptive Error Sampler engagement probability once `TRIGGER_THRESHOLD`
    /// is exceeded (`SAMPLE_RATE`).
    #[serde(default = "default_error_sample_rate")]
    pub error_sample_rate: f64,
    /// Anomaly Detector deviation factor (`DEVIATION_FACTOR`).
    #[serde(default = "default_deviation_factor")]
    pub deviation_factor: f64,
    /// Per-resource cap on a single hourly delta, to prevent a missing
    /// previous-hour counter from booking a cumulative value as hourly.
    #[serde(default = "default_max_reasonable_delta")]
    pub max_reasonable_delta: BTreeMap<String, u64>,
}

fn default_budget_soft_limit() -> f64 {
    0.8
}
fn default_budget_warning_threshold() -> f64 {
    0.8
}
fn default_budget_critical_threshold() -> f64 {
    0.95
}
fn default_alert_warning_pct() -> f64 {
    0.8
}
fn default_alert_critical_pct() -> f64 {
    0.95
}
fn default_utilization_warning_pct() -> f64 {
    80.0
}
fn default_utilization_critical_pct() -> f64 {
    95.0
}
fn default_sampling_full_threshold() -> f64 {
    0.6
}
fn default_sampling_half_threshold() -> f64 {
    0.8
}
fn default_sampling_quarter_threshold() -> f64 {
    0.9
}
fn default_cb_auto_reset_seconds() -> i64 {
    900
}
fn default_cb_cooldown_seconds() -> i64 {
    3600
}
fn default_cb_max_consecutive_trips() -> u32 {
    3
}
fn default_error_rate_threshold() -> f64 {
    0.10
}
fn default_error_rate_window_minutes() -> i64 {
    5
}
fn default_error_rate_min_requests() -> u64 {
    20
}
fn default_d1_write_limit() -> u64 {
    5_000_000
}
fn default_do_gb_seconds_daily_limit() -> u64 {
    1_000_000
}
fn default_hard_limit_multiplier() -> f64 {
    1.5
}
fn default_error_sample_rate() -> f64 {
    0.10
}
fn default_deviation_factor() -> f64 {
    3.0
}

fn default_max_reasonable_delta() -> BTreeMap<String, u64> {
    use ResourceTag::*;
    // Conservative per-resource hourly caps; deployments override via the
    // settings file. An invocation-shaped resource (writes, reads, requests)
    // gets a much lower cap than a byte/ms-shaped one (cpu-ms, gb-seconds).
    [
        (RelationalWrites, 1_000_000),
        (RelationalReads, 5_000_000),
        (CacheReads, 10_000_000),
        (CacheWrites, 5_000_000),
        (CacheDeletes, 1_000_000),
        (CacheLists, 1_000_000),
        (ObjectClassA, 1_000_000),
        (ObjectClassB, 5_000_000),
        (InferenceUnits, 50_000_000),
        (InferenceRequests, 1_000_000),
        (QueueMessages, 5_000_000),
        (ComputeRequests, 5_000_000),
        (CpuMs, 3_600_000_000),
        (VectorQueries, 5_000_000),
        (VectorInserts, 1_000_000),
        (DoRequests, 5_000_000),
        (DoGbSeconds, 1_000_000),
    ]
    .into_iter()
    .map(|(tag, cap)| (tag.as_str().to_string(), cap))
    .collect()
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            budget_soft_limit: default_budget_soft_limit(),
            budget_warning_threshold: default_budget_warning_threshold(),
            budget_critical_threshold: default_budget_critical_threshold(),
            alert_warning_pct: default_alert_warning_pct(),
            alert_critical_pct: default_alert_critical_pct(),
            utilization_warning_pct: default_utilization_warning_pct(),
            utilization_critical_pct: default_utilization_critical_pct(),
            sampling_full_threshold: default_sampling_full_threshold(),
            sampling_half_threshold: default_sampling_half_threshold(),
            sampling_quarter_threshold: default_sampling_quarter_threshold(),
            cb_auto_reset_seconds: default_cb_auto_reset_seconds(),
            cb_cooldown_seconds: default_cb_cooldown_seconds(),
            cb_max_consecutive_trips: default_cb_max_consecutive_trips(),
            error_rate_threshold: default_error_rate_threshold(),
            error_rate_window_minutes: default_error_rate_window_minutes(),
            error_rate_min_requests: default_error_rate_min_requests(),
            d1_write_limit: default_d1_write_limit(),
            do_gb_seconds_daily_limit: default_do_gb_seconds_daily_limit(),
            hard_limit_multiplier: default_hard_limit_multiplier(),
            error_sample_rate: default_error_sample_rate(),
            deviation_factor: default_deviation_factor(),
            max_reasonable_delta: default_max_reasonable_delta(),
        }
    }
}

impl PlatformSettings {
    /// Returns the configured delta cap for a resource, falling back to a
    /// conservative default if the resource is absent from the map (e.g. a
    /// deployment override that only lists a subset of resources).
    #[must_use]
    pub fn delta_cap(&self, tag: ResourceTag) -> u64 {
        self.max_reasonable_delta
            .get(tag.as_str())
            .copied()
            .unwrap_or(1_000_000)
    }

    /// Classifies a `d1_writes_24h / d1_write_limit` ratio into a sampling mode.
    #[must_use]
    pub fn sampling_mode_for_ratio(&self, ratio: f64) -> crate::settings::SamplingMode {
        if ratio < self.sampling_full_threshold {
            SamplingMode::Full
        } else if ratio < self.sampling_half_threshold {
            SamplingMode::Half
        } else if ratio < self.sampling_quarter_threshold {
            SamplingMode::Quarter
        } else {
            SamplingMode::Minimal
        }
    }
}

/// Adaptive collection-scheduler sampling mode.
///
/// The integer value is the scheduler cadence divisor: the scheduler runs
/// every hour but only executes a cycle when `current_hour % mode == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[repr(u8)]
pub enum SamplingMode {
    /// Run every hour.
    Full = 1,
    /// Run every 2 hours.
    Half = 2,
    /// Run every 4 hours.
    Quarter = 4,
    /// Run every 24 hours.
    Minimal = 24,
}

impl SamplingMode {
    /// The cadence divisor used for the `current_hour % mode` gate.
    #[must_use]
    pub fn cadence_hours(&self) -> u8 {
        *self as u8
    }

    /// True if `hour` falls on this mode's cadence.
    #[must_use]
    pub fn due_at(&self, hour: u32) -> bool {
        hour % u32::from(self.cadence_hours()) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_mode_thresholds() {
        let settings = PlatformSettings::default();
        assert_eq!(settings.sampling_mode_for_ratio(0.1), SamplingMode::Full);
        assert_eq!(settings.sampling_mode_for_ratio(0.7), SamplingMode::Half);
        assert_eq!(settings.sampling_mode_for_ratio(0.85), SamplingMode::Quarter);
        assert_eq!(settings.sampling_mode_for_ratio(0.95), SamplingMode::Minimal);
    }

    #[test]
    fn minimal_mode_due_once_a_day() {
        assert!(SamplingMode::Minimal.due_at(0));
        assert!(!SamplingMode::Minimal.due_at(5));
        assert!(SamplingMode::Full.due_at(5));
    }

    #[test]
    fn delta_cap_falls_back_for_unknown_resource() {
        let mut settings = PlatformSettings::default();
        settings
            .max_reasonable_delta
            .remove(ResourceTag::CpuMs.as_str());
        assert_eq!(settings.delta_cap(ResourceTag::CpuMs), 1_000_000);
    }
}
