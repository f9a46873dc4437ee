// SPDX-License-Identifier: Apache-2.0

//! Row types for the Relational Warehouse.
//!
//! These mirror the abstract relational schema one table per struct; concrete
//! SQL backends map each struct to a row via whatever ORM/driver they use.
//! Per-resource counters are carried as a [`MetricBundle`] rather than one
//! struct field per resource, since the resource taxonomy already lives
//! there and duplicating it here would drift.

use chrono::{DateTime, Utc};
use gov_core::{ErrorCategory, MetricBundle};
use gov_config::settings::SamplingMode;
use serde::{Deserialize, Serialize};

/// `hourly_usage_snapshots`, PK `(time_bucket, project)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySnapshot {
    /// Canonical hourly bucket string, e.g. `2026-07-28T14:00:00Z`.
    pub time_bucket: String,
    /// Project this row belongs to.
    pub project: String,
    /// Summed resource counters for the bucket.
    pub metrics: MetricBundle,
    /// Computed cost in USD for this bucket, summed across resources.
    pub cost_usd: f64,
    /// Sampling mode active when this snapshot was collected.
    pub sampling_mode: SamplingMode,
    /// Wall-clock time the collection ran.
    pub collection_timestamp: DateTime<Utc>,
}

/// `resource_usage_snapshots`, PK `(time_bucket, resource_type, resource_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsageSnapshot {
    /// Canonical hourly bucket string.
    pub time_bucket: String,
    /// Resource tag wire name (`ResourceTag::as_str`), or `"inference:{model}"`.
    pub resource_type: String,
    /// Identifier of the concrete resource instance (binding name, model id, etc).
    pub resource_id: String,
    /// Project this row belongs to.
    pub project: String,
    /// Count of units consumed.
    pub count: u64,
    /// Computed cost in USD.
    pub cost_usd: f64,
    /// Where this row's counters came from (`external-api`, `delta`, `collector`).
    pub source: String,
    /// Confidence in the reading: `1.0` for a direct external read, lower
    /// for an estimated/capped delta.
    pub confidence: f64,
    /// Human-readable note on how cost/allocation was derived (e.g. "pro-rated monthly").
    pub allocation_basis: String,
}

/// `daily_usage_rollups`, PK `(date, project)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRollup {
    /// Canonical date string, `YYYY-MM-DD`.
    pub date: String,
    /// Project this row belongs to.
    pub project: String,
    /// Summed resource counters across the day's hourly snapshots.
    pub metrics: MetricBundle,
    /// Summed cost in USD.
    pub cost_usd: f64,
    /// Aggregation logic version, bumped whenever the rollup formula changes.
    pub rollup_version: u32,
}

/// `monthly_usage_rollups`, PK `(month, project)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRollup {
    /// Canonical month string, `YYYY-MM`.
    pub month: String,
    /// Project this row belongs to.
    pub project: String,
    /// Summed resource counters across the month's daily rollups.
    pub metrics: MetricBundle,
    /// Summed cost in USD.
    pub cost_usd: f64,
    /// Aggregation logic version.
    pub rollup_version: u32,
}

/// Circuit-breaker event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitBreakerEventType {
    /// A budget or cost limit was exceeded and STOP was written.
    Trip,
    /// An auto-reset or manual-enable sweep cleared STOP.
    Reset,
    /// An administrator set STOP by hand.
    ManualDisable,
    /// An administrator cleared STOP by hand.
    ManualEnable,
}

/// `feature_circuit_breaker_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerEvent {
    /// Random row id.
    pub id: uuid::Uuid,
    /// Feature the event concerns.
    pub feature_key: String,
    /// What kind of transition this event records.
    pub event_type: CircuitBreakerEventType,
    /// Human-readable trip/reset reason, e.g. `"relational-writes=151>100"`.
    pub reason: String,
    /// Resource that was violated, if this was a resource trip (`cost_usd` for cost trips).
    pub violated_resource: Option<String>,
    /// The value observed at trip time.
    pub current_value: Option<f64>,
    /// The limit that was exceeded.
    pub budget_limit: Option<f64>,
    /// Whether this trip carries an automatic reset deadline.
    pub auto_reset: bool,
    /// Whether an alert was sent for this event.
    pub alert_sent: bool,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// `feature_error_events`, 7-day retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEventRow {
    /// Random row id.
    pub id: uuid::Uuid,
    /// Feature the error occurred in.
    pub feature_key: String,
    /// Classification bucket.
    pub category: ErrorCategory,
    /// Error code extracted from the originating error shape, if any.
    pub code: Option<String>,
    /// Correlation id propagated from the originating request.
    pub correlation_id: Option<String>,
    /// Escalation priority assigned by the alerter.
    pub priority: AlertPriority,
    /// When the error was recorded.
    pub created_at: DateTime<Utc>,
}

/// Alert escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertPriority {
    /// Immediate delivery.
    P0,
    /// Hourly digest.
    P1,
    /// Daily summary.
    P2,
}

/// `error_budget_windows`, PK `(feature_key, window_start)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBudgetWindow {
    /// Feature the window belongs to.
    pub feature_key: String,
    /// Window start (inclusive).
    pub window_start: DateTime<Utc>,
    /// Window end (exclusive).
    pub window_end: DateTime<Utc>,
    /// Successful (non-error) message count observed in the window.
    pub success_count: u64,
    /// Error message count observed in the window.
    pub error_count: u64,
    /// Per-category error counts observed in the window.
    pub per_category: std::collections::HashMap<ErrorCategory, u64>,
}

impl ErrorBudgetWindow {
    /// Total messages observed in the window.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.success_count + self.error_count
    }

    /// Error rate in `[0, 1]`, or `0.0` if no messages were observed.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.error_count as f64 / total as f64
        }
    }
}

/// `anomalies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Random row id.
    pub id: uuid::Uuid,
    /// When the anomaly was detected.
    pub detected_at: DateTime<Utc>,
    /// Name of the metric that went anomalous (resource tag wire name).
    pub metric_name: String,
    /// Project the anomaly was detected in.
    pub project: String,
    /// The value that triggered detection.
    pub current_value: f64,
    /// The 7-day rolling mean at detection time.
    pub rolling_avg: f64,
    /// The 7-day rolling standard deviation at detection time.
    pub rolling_stddev: f64,
    /// `|current - avg| / stddev`.
    pub deviation_factor: f64,
    /// Whether an alert was sent for this anomaly.
    pub alert_sent: bool,
    /// Whether the anomaly has since been marked resolved.
    pub resolved: bool,
}

/// `feature_registry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRegistryEntry {
    /// Canonical `project:category:feature` string.
    pub feature_key: String,
    /// Project id.
    pub project_id: String,
    /// Category component.
    pub category: String,
    /// Feature component.
    pub feature: String,
    /// Human-readable display name for dashboards.
    pub display_name: String,
    /// Whether the circuit breaker is enabled for this feature.
    pub circuit_breaker_enabled: bool,
    /// Raw JSON-encoded default `BudgetLimits` for this feature.
    pub daily_limits_json: String,
}

/// `feature_health`, backing the Heartbeat Handler's "last-seen health" cell
/// (per-feature health probes). Not named in the literal RW schema
/// list, but required to store what the Heartbeat Handler writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureHealth {
    /// Feature the health row concerns.
    pub feature_key: String,
    /// `"healthy"` after a successful heartbeat.
    pub status: String,
    /// Timestamp of the most recent heartbeat.
    pub last_seen: DateTime<Utc>,
}

/// Per-model inference usage, daily conflict resolution on `invocations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerModelUsage {
    /// Canonical date string, `YYYY-MM-DD`.
    pub date: String,
    /// Feature the usage belongs to.
    pub feature_key: String,
    /// Model identifier.
    pub model: String,
    /// Accumulated invocation count for the day.
    pub invocations: u64,
}
