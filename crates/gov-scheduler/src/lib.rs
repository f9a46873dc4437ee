// SPDX-License-Identifier: Apache-2.0

//! The Collection Scheduler: hourly cron-driven pull of cumulative
//! external counters, delta accounting with caps, batched persistence, and
//! midnight maintenance (daily/monthly rollup, gap-fill, anomaly pass,
//! retention cleanup).

/// Resource-row construction and batched warehouse persistence.
pub mod batching;
/// The external telemetry source abstraction.
pub mod collector;
/// Cumulative-to-hourly delta computation with per-resource caps.
pub mod delta;
/// Errors raised by this crate.
pub mod error;
/// Midnight daily/monthly maintenance.
pub mod midnight;
/// Exponential-backoff retry around the external collector pull.
pub mod retry;
/// External dead-man's-switch heartbeat.
pub mod watchdog;

pub use batching::{build_rows, persist_batched};
pub use collector::{CollectorError, ExternalMetricsCollector};
pub use delta::compute_delta;
pub use error::SchedulerError;
pub use midnight::run_midnight_tasks;
pub use retry::pull_with_backoff;
pub use watchdog::{LoggingWatchdog, Watchdog};

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use gov_config::settings::SamplingMode;
use gov_config::PlatformSettings;
use gov_core::MetricBundle;
use gov_kvcs::{keys, KeyValueControlStore, KvcsJsonExt};
use gov_pricing::{MonthlyBaseCost, PricingTable};
use gov_warehouse::model::HourlySnapshot;
use gov_warehouse::RelationalWarehouse;

/// Project identifier the account-level aggregate hourly snapshot is
/// stored under, distinct from any real project id.
pub const ACCOUNT_LEVEL_PROJECT: &str = "__account__";

/// KVCS TTL for the cumulative-counter write-back cells.
const CUMULATIVE_COUNTER_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// What one hourly collection cycle did, for logging/testing.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyCycleOutcome {
    /// True if the cycle bailed early (global STOP, or off the sampling cadence).
    pub skipped: bool,
    /// The sampling mode the cycle ran (or would have run) at.
    pub sampling_mode: SamplingMode,
    /// Number of projects whose counters were collected this cycle.
    pub projects_collected: usize,
}

/// Runs one hourly collection cycle over `projects`.
///
/// Steps 10-11 (midnight maintenance, heartbeat) are the caller's
/// responsibility: midnight maintenance via [`run_midnight_tasks`], and the
/// heartbeat ping happens regardless of whether this function returns `Ok`
/// or `Err`, so the caller pings `watchdog` itself around this call.
pub async fn run_hourly_cycle(
    warehouse: &dyn RelationalWarehouse,
    kvcs: &dyn KeyValueControlStore,
    collector: &dyn ExternalMetricsCollector,
    pricing: &PricingTable,
    base_cost: &MonthlyBaseCost,
    settings: &PlatformSettings,
    projects: &[String],
    now: DateTime<Utc>,
) -> Result<HourlyCycleOutcome, SchedulerError> {
    // Step 1: global STOP flag.
    if kvcs.get_raw(keys::GLOBAL_STATUS).await?.as_deref() == Some("STOP") {
        tracing::warn!("hourly collection cycle skipped: global STOP flag set");
        return Ok(HourlyCycleOutcome {
            skipped: true,
            sampling_mode: SamplingMode::Full,
            projects_collected: 0,
        });
    }

    // Step 2: sampling-mode gate on d1_writes_24h / d1_write_limit.
    let writes_24h = kvcs
        .incr_by(keys::GLOBAL_RELATIONAL_WRITES_24H, 0, None)
        .await?
        .max(0) as u64;
    let ratio = writes_24h as f64 / settings.d1_write_limit.max(1) as f64;
    let sampling_mode = settings.sampling_mode_for_ratio(ratio);
    if !sampling_mode.due_at(now.hour()) {
        tracing::debug!(?sampling_mode, hour = now.hour(), "hourly collection cycle off-cadence, skipping");
        return Ok(HourlyCycleOutcome {
            skipped: true,
            sampling_mode,
            projects_collected: 0,
        });
    }

    let mut account_delta = MetricBundle::new();
    let mut projects_collected = 0usize;

    for project in projects {
        // Step 3: validate credential; abort this project rather than book
        // wrong data.
        if let Err(source) = collector.validate_credential(project).await {
            return Err(SchedulerError::CredentialInvalid {
                project: project.clone(),
                source,
            });
        }

        // Step 4: cumulative pull with exponential-backoff retry.
        let current = pull_with_backoff(collector, project)
            .await
            .map_err(|(attempts, source)| SchedulerError::CollectionFailed {
                project: project.clone(),
                attempts,
                source,
            })?;

        // Step 5: prior-hour cumulative counters from KVCS.
        let previous = kvcs
            .get_json::<MetricBundle>(&keys::prev_hour_project_metrics(project))
            .await?
            .unwrap_or_default();

        // Step 6: per-metric delta, capped.
        let delta = compute_delta(&current, &previous, settings);

        // Step 7: hourly pro-rated cost, account-level and per-project rows.
        let cf_cost = gov_cost::calculate_cf_cost(&delta, pricing);
        let prorated_base: f64 = gov_core::ResourceTag::ALL
            .iter()
            .map(|tag| base_cost.hourly_prorated(*tag))
            .sum();
        let hourly_cost_usd = cf_cost + prorated_base;

        let time_bucket = gov_core::TimeBucket::hourly(now).canonical();
        warehouse
            .upsert_hourly_snapshot(HourlySnapshot {
                time_bucket: time_bucket.clone(),
                project: project.clone(),
                metrics: delta.clone(),
                cost_usd: hourly_cost_usd,
                sampling_mode,
                collection_timestamp: now,
            })
            .await?;

        // Step 8: batched resource-level rows, falling back to individual
        // inserts on partial batch failure.
        let rows = build_rows(&time_bucket, project, &delta, pricing, "external-api", 1.0, "pro-rated monthly base");
        persist_batched(warehouse, rows).await?;

        // Step 9: write current cumulative counters back with TTL >= 7d.
        kvcs.put_json(
            &keys::prev_hour_project_metrics(project),
            &current,
            Some(CUMULATIVE_COUNTER_TTL),
        )
        .await?;

        account_delta += &delta;
        projects_collected += 1;
    }

    if projects_collected > 0 {
        let time_bucket = gov_core::TimeBucket::hourly(now).canonical();
        let account_cost = gov_cost::calculate_cf_cost(&account_delta, pricing);
        warehouse
            .upsert_hourly_snapshot(HourlySnapshot {
                time_bucket,
                project: ACCOUNT_LEVEL_PROJECT.to_string(),
                metrics: account_delta.clone(),
                cost_usd: account_cost,
                sampling_mode,
                collection_timestamp: now,
            })
            .await?;
        kvcs.put_json(
            keys::PREV_HOUR_ACCOUNT_METRICS,
            &account_delta,
            Some(CUMULATIVE_COUNTER_TTL),
        )
        .await?;
    }

    Ok(HourlyCycleOutcome {
        skipped: false,
        sampling_mode,
        projects_collected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gov_core::ResourceTag;
    use gov_kvcs::InMemoryKvcs;
    use gov_warehouse::InMemoryWarehouse;

    struct FixedCollector {
        cumulative: u64,
    }

    #[async_trait]
    impl ExternalMetricsCollector for FixedCollector {
        async fn validate_credential(&self, _project: &str) -> Result<(), CollectorError> {
            Ok(())
        }

        async fn pull_cumulative_counters(&self, _project: &str) -> Result<MetricBundle, CollectorError> {
            let mut bundle = MetricBundle::new();
            bundle.set(ResourceTag::RelationalWrites, self.cumulative);
            Ok(bundle)
        }
    }

    #[tokio::test]
    async fn global_stop_flag_skips_the_cycle() {
        let warehouse = InMemoryWarehouse::new();
        let kvcs = InMemoryKvcs::new();
        kvcs.put_raw(keys::GLOBAL_STATUS, "STOP".to_string(), None).await.unwrap();
        let collector = FixedCollector { cumulative: 100 };
        let outcome = run_hourly_cycle(
            &warehouse,
            &kvcs,
            &collector,
            &PricingTable::default(),
            &MonthlyBaseCost::default(),
            &PlatformSettings::default(),
            &["acme".to_string()],
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(outcome.skipped);
        assert_eq!(outcome.projects_collected, 0);
    }

    #[tokio::test]
    async fn collects_delta_and_writes_back_cumulative_counters() {
        let warehouse = InMemoryWarehouse::new();
        let kvcs = InMemoryKvcs::new();
        kvcs.put_json(
            &keys::prev_hour_project_metrics("acme"),
            &{
                let mut bundle = MetricBundle::new();
                bundle.set(ResourceTag::RelationalWrites, 40);
                bundle
            },
            None,
        )
        .await
        .unwrap();
        let collector = FixedCollector { cumulative: 100 };
        let now = Utc::now();
        let outcome = run_hourly_cycle(
            &warehouse,
            &kvcs,
            &collector,
            &PricingTable::default(),
            &MonthlyBaseCost::default(),
            &PlatformSettings::default(),
            &["acme".to_string()],
            now,
        )
        .await
        .unwrap();
        assert!(!outcome.skipped);
        assert_eq!(outcome.projects_collected, 1);

        let snapshots = warehouse
            .list_hourly_snapshots("acme", now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].metrics.get(ResourceTag::RelationalWrites), 60);

        let written_back = kvcs
            .get_json::<MetricBundle>(&keys::prev_hour_project_metrics("acme"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(written_back.get(ResourceTag::RelationalWrites), 100);
    }

    #[tokio::test]
    async fn off_cadence_hour_is_skipped_under_minimal_sampling() {
        let warehouse = InMemoryWarehouse::new();
        let kvcs = InMemoryKvcs::new();
        let settings = PlatformSettings::default();
        kvcs.incr_by(
            keys::GLOBAL_RELATIONAL_WRITES_24H,
            (settings.d1_write_limit as f64 * 0.95) as i64,
            None,
        )
        .await
        .unwrap();
        let collector = FixedCollector { cumulative: 100 };
        let mut at = Utc::now();
        while at.hour() % 24 == 0 {
            at += chrono::Duration::hours(1);
        }
        let outcome = run_hourly_cycle(
            &warehouse,
            &kvcs,
            &collector,
            &PricingTable::default(),
            &MonthlyBaseCost::default(),
            &settings,
            &["acme".to_string()],
            at,
        )
        .await
        .unwrap();
        assert!(outcome.skipped);
        assert_eq!(outcome.sampling_mode, SamplingMode::Minimal);
    }
}
