// SPDX-License-Identifier: Apache-2.0

//! Midnight daily maintenance: prior-day rollup, monthly
//! rollup on the 1st, gap-fill, registry auto-reset sweep, anomaly
//! detection, and error-event retention cleanup.

use chrono::{DateTime, Datelike, Utc};
use gov_budget::CircuitBreaker;
use gov_config::PlatformSettings;
use gov_core::{FeatureKey, ResourceTag, TimeBucket};
use gov_kvcs::{keys, KeyValueControlStore};
use gov_warehouse::RelationalWarehouse;

use crate::error::SchedulerError;

/// How many trailing days the gap-fill scan checks for a missing daily rollup.
const GAP_FILL_LOOKBACK_DAYS: i64 = 3;
/// Error-event retention window.
const ERROR_EVENT_RETENTION_DAYS: i64 = 7;

/// Runs the midnight maintenance pass over every distinct project named in
/// the feature registry. Returns the number of projects whose prior-day
/// rollup was (re)computed.
pub async fn run_midnight_tasks(
    warehouse: &dyn RelationalWarehouse,
    kvcs: &dyn KeyValueControlStore,
    breaker: &CircuitBreaker,
    settings: &PlatformSettings,
    now: DateTime<Utc>,
) -> Result<usize, SchedulerError> {
    let registry = warehouse.list_feature_registry().await?;
    let mut projects: Vec<String> = registry.iter().map(|e| e.project_id.clone()).collect();
    projects.sort();
    projects.dedup();

    let yesterday = now - chrono::Duration::days(1);
    let yesterday_date = TimeBucket::daily(yesterday).canonical();
    for project in &projects {
        gov_rollup::rollup_daily(warehouse, project, yesterday).await?;
        // the query service repopulates from
        // canonical data rather than serving a stale pre-rollup cache hit.
        kvcs.delete(&keys::query_cache(&yesterday_date, project)).await?;
        if now.day() == 1 {
            gov_rollup::rollup_monthly(warehouse, project, yesterday).await?;
        }
        gap_fill(warehouse, kvcs, project, now).await?;
        detect_anomalies(warehouse, settings, project, now).await?;
    }

    let candidates = registry
        .iter()
        .filter_map(|e| FeatureKey::new(e.project_id.clone(), e.category.clone(), e.feature.clone()).ok());
    let _ = breaker.auto_reset_sweep(candidates, now).await?;

    let cutoff = now - chrono::Duration::days(ERROR_EVENT_RETENTION_DAYS);
    let deleted = warehouse.delete_error_events_before(cutoff).await?;
    tracing::info!(deleted, "error-event retention cleanup complete");

    Ok(projects.len())
}

async fn gap_fill(
    warehouse: &dyn RelationalWarehouse,
    kvcs: &dyn KeyValueControlStore,
    project: &str,
    now: DateTime<Utc>,
) -> Result<(), SchedulerError> {
    for days_back in 1..=GAP_FILL_LOOKBACK_DAYS {
        let at = now - chrono::Duration::days(days_back);
        let date = TimeBucket::daily(at).canonical();
        if warehouse.get_daily_rollup(&date, project).await?.is_none() {
            tracing::warn!(project, date, "gap-fill: reconstructing missing daily rollup");
            gov_rollup::reconstruct_daily(warehouse, project, at).await?;
            kvcs.delete(&keys::query_cache(&date, project)).await?;
        }
    }
    Ok(())
}

async fn detect_anomalies(
    warehouse: &dyn RelationalWarehouse,
    settings: &PlatformSettings,
    project: &str,
    now: DateTime<Utc>,
) -> Result<(), SchedulerError> {
    if let Some(anomaly) =
        gov_rollup::detect_daily_anomaly(warehouse, settings, project, "cost_usd", |r| r.cost_usd, now).await?
    {
        tracing::warn!(project, deviation_factor = anomaly.deviation_factor, "cost anomaly detected");
    }

    for tag in ResourceTag::ALL {
        let metric_name = tag.as_str();
        if let Some(anomaly) =
            gov_rollup::detect_daily_anomaly(warehouse, settings, project, metric_name, move |r| r.metrics.get(tag) as f64, now)
                .await?
        {
            tracing::warn!(project, metric_name, deviation_factor = anomaly.deviation_factor, "resource anomaly detected");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_core::MetricBundle;
    use gov_kvcs::InMemoryKvcs;
    use gov_warehouse::model::FeatureRegistryEntry;
    use gov_warehouse::InMemoryWarehouse;
    use std::sync::Arc;

    async fn seed_registry(warehouse: &InMemoryWarehouse, project: &str) {
        warehouse
            .upsert_feature_registry(FeatureRegistryEntry {
                feature_key: format!("{project}:checkout:stripe-charge"),
                project_id: project.to_string(),
                category: "checkout".to_string(),
                feature: "stripe-charge".to_string(),
                display_name: "Stripe Charge".to_string(),
                circuit_breaker_enabled: true,
                daily_limits_json: "{}".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rolls_up_yesterday_for_every_registered_project() {
        let warehouse = InMemoryWarehouse::new();
        seed_registry(&warehouse, "acme").await;

        let yesterday = chrono::Utc::now() - chrono::Duration::days(1);
        let mut metrics = MetricBundle::new();
        metrics.set(ResourceTag::RelationalWrites, 10);
        warehouse
            .accumulate_hourly_snapshot(
                &TimeBucket::hourly(yesterday).canonical(),
                "acme",
                &metrics,
                0.1,
                gov_config::settings::SamplingMode::Full,
                yesterday,
            )
            .await
            .unwrap();

        let kvcs = InMemoryKvcs::new();
        let breaker = CircuitBreaker::new(Arc::new(InMemoryKvcs::new()), Arc::new(InMemoryWarehouse::new()));
        let settings = PlatformSettings::default();
        let now = chrono::Utc::now();
        let projects_touched = run_midnight_tasks(&warehouse, &kvcs, &breaker, &settings, now).await.unwrap();
        assert_eq!(projects_touched, 1);

        let date = TimeBucket::daily(yesterday).canonical();
        let rollup = warehouse.get_daily_rollup(&date, "acme").await.unwrap().unwrap();
        assert_eq!(rollup.metrics.get(ResourceTag::RelationalWrites), 10);
    }

    #[tokio::test]
    async fn cleans_up_error_events_older_than_retention() {
        let warehouse = InMemoryWarehouse::new();
        let kvcs = InMemoryKvcs::new();
        let breaker = CircuitBreaker::new(Arc::new(InMemoryKvcs::new()), Arc::new(InMemoryWarehouse::new()));
        let settings = PlatformSettings::default();
        let now = chrono::Utc::now();

        warehouse
            .insert_error_event(gov_warehouse::model::ErrorEventRow {
                id: uuid::Uuid::new_v4(),
                feature_key: "acme:checkout:stripe-charge".to_string(),
                category: gov_core::ErrorCategory::Internal,
                code: None,
                correlation_id: None,
                priority: gov_warehouse::model::AlertPriority::P2,
                created_at: now - chrono::Duration::days(8),
            })
            .await
            .unwrap();

        run_midnight_tasks(&warehouse, &kvcs, &breaker, &settings, now).await.unwrap();
        let remaining = warehouse.list_error_events_since(now - chrono::Duration::days(30)).await.unwrap();
        assert!(remaining.is_empty());
    }
}
