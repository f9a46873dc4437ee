// SPDX-License-Identifier: Apache-2.0

//! The Relational Warehouse (RW) abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gov_config::settings::SamplingMode;
use gov_core::MetricBundle;

use crate::error::WarehouseError;
use crate::model::{
    AnomalyRecord, CircuitBreakerEvent, DailyRollup, ErrorBudgetWindow, ErrorEventRow,
    FeatureHealth, FeatureRegistryEntry, HourlySnapshot, MonthlyRollup, PerModelUsage,
    ResourceUsageSnapshot,
};

/// Abstraction over a SQL store for rollups, error events, budget events,
/// anomaly records, and the feature registry.
///
/// All mutations are idempotent: upserts are keyed `INSERT ... ON CONFLICT
/// DO UPDATE` (or `INSERT OR REPLACE`) so at-least-once delivery and
/// multi-instance retries never double-count.
/// Appends (events) use random ids and are safe to retry outright.
#[async_trait]
pub trait RelationalWarehouse: Send + Sync {
    /// Idempotently upserts an hourly snapshot keyed `(time_bucket, project)`.
    async fn upsert_hourly_snapshot(&self, row: HourlySnapshot) -> Result<(), WarehouseError>;

    /// Additively folds one message's metrics and cost into the hourly
    /// snapshot keyed `(time_bucket, project)`, creating it if absent.
    async fn accumulate_hourly_snapshot(
        &self,
        time_bucket: &str,
        project: &str,
        metrics_delta: &MetricBundle,
        cost_delta_usd: f64,
        sampling_mode: SamplingMode,
        collection_timestamp: DateTime<Utc>,
    ) -> Result<HourlySnapshot, WarehouseError>;

    /// Lists hourly snapshots for `project` in `[start, end)`, used by the
    /// Rollup Engine's daily aggregation and gap-fill reconstruction.
    async fn list_hourly_snapshots(
        &self,
        project: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlySnapshot>, WarehouseError>;

    /// Writes a batch of resource-level rows. Implementations
    /// should write atomically in groups; on partial failure, the caller
    /// (the Collection Scheduler) falls back to individual inserts.
    async fn insert_resource_usage_snapshots_batch(
        &self,
        rows: Vec<ResourceUsageSnapshot>,
    ) -> Result<(), WarehouseError>;

    /// Idempotently upserts a daily rollup keyed `(date, project)`.
    async fn upsert_daily_rollup(&self, row: DailyRollup) -> Result<(), WarehouseError>;

    /// Fetches the daily rollup for `(date, project)`, if present.
    async fn get_daily_rollup(
        &self,
        date: &str,
        project: &str,
    ) -> Result<Option<DailyRollup>, WarehouseError>;

    /// Lists daily rollups for `project` in `[start, end)` date strings
    /// (inclusive start, inclusive end), used by the Anomaly Detector's
    /// 7-day rolling window.
    async fn list_daily_rollups(
        &self,
        project: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DailyRollup>, WarehouseError>;

    /// Deletes the daily rollup for `(date, project)`.
    async fn delete_daily_rollup(&self, date: &str, project: &str) -> Result<(), WarehouseError>;

    /// Idempotently upserts a monthly rollup keyed `(month, project)`.
    async fn upsert_monthly_rollup(&self, row: MonthlyRollup) -> Result<(), WarehouseError>;

    /// Appends a circuit-breaker trip/reset/manual event row.
    async fn insert_circuit_breaker_event(
        &self,
        row: CircuitBreakerEvent,
    ) -> Result<(), WarehouseError>;

    /// Appends an error event row (post-sampling decision).
    async fn insert_error_event(&self, row: ErrorEventRow) -> Result<(), WarehouseError>;

    /// Lists error events created at or after `since`, used by the hourly
    /// P1 digest and the daily P2 summary.
    async fn list_error_events_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ErrorEventRow>, WarehouseError>;

    /// Deletes error events older than the 7-day retention window.
    async fn delete_error_events_before(&self, before: DateTime<Utc>)
    -> Result<u64, WarehouseError>;

    /// Adds `success_delta`/`error_delta` (plus per-category deltas) to the
    /// rolling error-budget window row keyed `(feature_key, window_start)`,
    /// creating it if absent.
    async fn accumulate_error_budget_window(
        &self,
        feature_key: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        success_delta: u64,
        error_delta: u64,
        category: Option<gov_core::ErrorCategory>,
    ) -> Result<ErrorBudgetWindow, WarehouseError>;

    /// Fetches the current error-budget window for `feature_key` covering `at`.
    async fn get_error_budget_window(
        &self,
        feature_key: &str,
        window_start: DateTime<Utc>,
    ) -> Result<Option<ErrorBudgetWindow>, WarehouseError>;

    /// Appends an anomaly record.
    async fn insert_anomaly(&self, row: AnomalyRecord) -> Result<(), WarehouseError>;

    /// Lists unresolved anomalies for `(metric_name, project)`, used for
    /// alert deduplication.
    async fn list_unresolved_anomalies(
        &self,
        metric_name: &str,
        project: &str,
    ) -> Result<Vec<AnomalyRecord>, WarehouseError>;

    /// Marks an anomaly resolved.
    async fn resolve_anomaly(&self, id: uuid::Uuid) -> Result<(), WarehouseError>;

    /// Looks up a feature's registry entry (default budget catalog lookup).
    async fn get_feature_registry(
        &self,
        feature_key: &str,
    ) -> Result<Option<FeatureRegistryEntry>, WarehouseError>;

    /// Upserts a feature registry entry.
    async fn upsert_feature_registry(
        &self,
        entry: FeatureRegistryEntry,
    ) -> Result<(), WarehouseError>;

    /// Lists every registered feature, used by the Collection Scheduler's
    /// midnight registry-cleanup and auto-reset-sweep candidate discovery.
    async fn list_feature_registry(&self) -> Result<Vec<FeatureRegistryEntry>, WarehouseError>;

    /// Upserts the per-feature heartbeat health row.
    async fn upsert_feature_health(&self, row: FeatureHealth) -> Result<(), WarehouseError>;

    /// Fetches the heartbeat health row for `feature_key`, if present.
    async fn get_feature_health(
        &self,
        feature_key: &str,
    ) -> Result<Option<FeatureHealth>, WarehouseError>;

    /// Upserts per-model usage with additive `invocations` conflict
    /// resolution.
    async fn upsert_per_model_usage(
        &self,
        date: &str,
        feature_key: &str,
        model: &str,
        invocations_delta: u64,
    ) -> Result<(), WarehouseError>;
}
