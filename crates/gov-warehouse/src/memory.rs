// SPDX-License-Identifier: Apache-2.0

//! In-memory [`RelationalWarehouse`] test double, backed by
//! [`parking_lot::Mutex`]-guarded `Vec`/`HashMap`s. Good enough for unit and
//! integration tests; never holds a lock across an `.await`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gov_config::settings::SamplingMode;
use gov_core::MetricBundle;
use parking_lot::Mutex;

use crate::error::WarehouseError;
use crate::model::{
    AnomalyRecord, CircuitBreakerEvent, DailyRollup, ErrorBudgetWindow, ErrorEventRow,
    FeatureHealth, FeatureRegistryEntry, HourlySnapshot, MonthlyRollup, PerModelUsage,
    ResourceUsageSnapshot,
};
use crate::store::RelationalWarehouse;

#[derive(Default)]
struct Tables {
    hourly: HashMap<(String, String), HourlySnapshot>,
    resource_usage: Vec<ResourceUsageSnapshot>,
    daily: HashMap<(String, String), DailyRollup>,
    monthly: HashMap<(String, String), MonthlyRollup>,
    cb_events: Vec<CircuitBreakerEvent>,
    error_events: Vec<ErrorEventRow>,
    error_windows: HashMap<(String, DateTime<Utc>), ErrorBudgetWindow>,
    anomalies: Vec<AnomalyRecord>,
    registry: HashMap<String, FeatureRegistryEntry>,
    health: HashMap<String, FeatureHealth>,
    per_model: HashMap<(String, String, String), PerModelUsage>,
}

/// An in-memory warehouse. Not persistent; intended for tests.
#[derive(Default)]
pub struct InMemoryWarehouse {
    tables: Mutex<Tables>,
}

impl InMemoryWarehouse {
    /// An empty warehouse.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelationalWarehouse for InMemoryWarehouse {
    async fn upsert_hourly_snapshot(&self, row: HourlySnapshot) -> Result<(), WarehouseError> {
        let key = (row.time_bucket.clone(), row.project.clone());
        let _ = self.tables.lock().hourly.insert(key, row);
        Ok(())
    }

    async fn accumulate_hourly_snapshot(
        &self,
        time_bucket: &str,
        project: &str,
        metrics_delta: &MetricBundle,
        cost_delta_usd: f64,
        sampling_mode: SamplingMode,
        collection_timestamp: DateTime<Utc>,
    ) -> Result<HourlySnapshot, WarehouseError> {
        let mut tables = self.tables.lock();
        let key = (time_bucket.to_string(), project.to_string());
        let entry = tables.hourly.entry(key).or_insert_with(|| HourlySnapshot {
            time_bucket: time_bucket.to_string(),
            project: project.to_string(),
            metrics: MetricBundle::new(),
            cost_usd: 0.0,
            sampling_mode,
            collection_timestamp,
        });
        entry.metrics += metrics_delta;
        entry.cost_usd += cost_delta_usd;
        entry.collection_timestamp = collection_timestamp;
        Ok(entry.clone())
    }

    async fn list_hourly_snapshots(
        &self,
        project: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlySnapshot>, WarehouseError> {
        let tables = self.tables.lock();
        let mut rows: Vec<_> = tables
            .hourly
            .values()
            .filter(|r| r.project == project)
            .filter(|r| {
                DateTime::parse_from_rfc3339(&r.time_bucket)
                    .map(|t| {
                        let t = t.with_timezone(&Utc);
                        t >= start && t < end
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.time_bucket.cmp(&b.time_bucket));
        Ok(rows)
    }

    async fn insert_resource_usage_snapshots_batch(
        &self,
        rows: Vec<ResourceUsageSnapshot>,
    ) -> Result<(), WarehouseError> {
        self.tables.lock().resource_usage.extend(rows);
        Ok(())
    }

    async fn upsert_daily_rollup(&self, row: DailyRollup) -> Result<(), WarehouseError> {
        let key = (row.date.clone(), row.project.clone());
        let _ = self.tables.lock().daily.insert(key, row);
        Ok(())
    }

    async fn get_daily_rollup(
        &self,
        date: &str,
        project: &str,
    ) -> Result<Option<DailyRollup>, WarehouseError> {
        Ok(self
            .tables
            .lock()
            .daily
            .get(&(date.to_string(), project.to_string()))
            .cloned())
    }

    async fn list_daily_rollups(
        &self,
        project: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DailyRollup>, WarehouseError> {
        let tables = self.tables.lock();
        let mut rows: Vec<_> = tables
            .daily
            .values()
            .filter(|r| r.project == project && r.date.as_str() >= start_date && r.date.as_str() <= end_date)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    async fn delete_daily_rollup(&self, date: &str, project: &str) -> Result<(), WarehouseError> {
        let _ = self
            .tables
            .lock()
            .daily
            .remove(&(date.to_string(), project.to_string()));
        Ok(())
    }

    async fn upsert_monthly_rollup(&self, row: MonthlyRollup) -> Result<(), WarehouseError> {
        let key = (row.month.clone(), row.project.clone());
        let _ = self.tables.lock().monthly.insert(key, row);
        Ok(())
    }

    async fn insert_circuit_breaker_event(
        &self,
        row: CircuitBreakerEvent,
    ) -> Result<(), WarehouseError> {
        self.tables.lock().cb_events.push(row);
        Ok(())
    }

    async fn insert_error_event(&self, row: ErrorEventRow) -> Result<(), WarehouseError> {
        self.tables.lock().error_events.push(row);
        Ok(())
    }

    async fn list_error_events_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ErrorEventRow>, WarehouseError> {
        Ok(self
            .tables
            .lock()
            .error_events
            .iter()
            .filter(|e| e.created_at >= since)
            .cloned()
            .collect())
    }

    async fn delete_error_events_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<u64, WarehouseError> {
        let mut tables = self.tables.lock();
        let before_len = tables.error_events.len();
        tables.error_events.retain(|e| e.created_at >= before);
        Ok((before_len - tables.error_events.len()) as u64)
    }

    async fn accumulate_error_budget_window(
        &self,
        feature_key: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        success_delta: u64,
        error_delta: u64,
        category: Option<gov_core::ErrorCategory>,
    ) -> Result<ErrorBudgetWindow, WarehouseError> {
        let mut tables = self.tables.lock();
        let key = (feature_key.to_string(), window_start);
        let entry = tables.error_windows.entry(key).or_insert_with(|| ErrorBudgetWindow {
            feature_key: feature_key.to_string(),
            window_start,
            window_end,
            success_count: 0,
            error_count: 0,
            per_category: HashMap::new(),
        });
        entry.success_count += success_delta;
        entry.error_count += error_delta;
        if let Some(category) = category {
            *entry.per_category.entry(category).or_insert(0) += error_delta.max(1);
        }
        Ok(entry.clone())
    }

    async fn get_error_budget_window(
        &self,
        feature_key: &str,
        window_start: DateTime<Utc>,
    ) -> Result<Option<ErrorBudgetWindow>, WarehouseError> {
        Ok(self
            .tables
            .lock()
            .error_windows
            .get(&(feature_key.to_string(), window_start))
            .cloned())
    }

    async fn insert_anomaly(&self, row: AnomalyRecord) -> Result<(), WarehouseError> {
        self.tables.lock().anomalies.push(row);
        Ok(())
    }

    async fn list_unresolved_anomalies(
        &self,
        metric_name: &str,
        project: &str,
    ) -> Result<Vec<AnomalyRecord>, WarehouseError> {
        Ok(self
            .tables
            .lock()
            .anomalies
            .iter()
            .filter(|a| !a.resolved && a.metric_name == metric_name && a.project == project)
            .cloned()
            .collect())
    }

    async fn resolve_anomaly(&self, id: uuid::Uuid) -> Result<(), WarehouseError> {
        let mut tables = self.tables.lock();
        let Some(anomaly) = tables.anomalies.iter_mut().find(|a| a.id == id) else {
            return Err(WarehouseError::NotFound(id.to_string()));
        };
        anomaly.resolved = true;
        Ok(())
    }

    async fn get_feature_registry(
        &self,
        feature_key: &str,
    ) -> Result<Option<FeatureRegistryEntry>, WarehouseError> {
        Ok(self.tables.lock().registry.get(feature_key).cloned())
    }

    async fn upsert_feature_registry(
        &self,
        entry: FeatureRegistryEntry,
    ) -> Result<(), WarehouseError> {
        let _ = self
            .tables
            .lock()
            .registry
            .insert(entry.feature_key.clone(), entry);
        Ok(())
    }

    async fn list_feature_registry(&self) -> Result<Vec<FeatureRegistryEntry>, WarehouseError> {
        Ok(self.tables.lock().registry.values().cloned().collect())
    }

    async fn upsert_feature_health(&self, row: FeatureHealth) -> Result<(), WarehouseError> {
        let _ = self.tables.lock().health.insert(row.feature_key.clone(), row);
        Ok(())
    }

    async fn get_feature_health(
        &self,
        feature_key: &str,
    ) -> Result<Option<FeatureHealth>, WarehouseError> {
        Ok(self.tables.lock().health.get(feature_key).cloned())
    }

    async fn upsert_per_model_usage(
        &self,
        date: &str,
        feature_key: &str,
        model: &str,
        invocations_delta: u64,
    ) -> Result<(), WarehouseError> {
        let mut tables = self.tables.lock();
        let key = (date.to_string(), feature_key.to_string(), model.to_string());
        let entry = tables.per_model.entry(key).or_insert_with(|| PerModelUsage {
            date: date.to_string(),
            feature_key: feature_key.to_string(),
            model: model.to_string(),
            invocations: 0,
        });
        entry.invocations += invocations_delta;
        Ok(())
    }
}
