// SPDX-License-Identifier: Apache-2.0

//! The Rollup Engine: aggregates hourly snapshots into daily
//! rollups, and daily rollups into monthly rollups, relying entirely on
//! [`gov_core::MetricBundle`]'s additivity. Every write is idempotent and
//! safe to re-run.

use chrono::{DateTime, Utc};
use gov_core::{MetricBundle, TimeBucket};
use gov_warehouse::model::{DailyRollup, MonthlyRollup};
use gov_warehouse::RelationalWarehouse;

use crate::error::RollupError;

/// Aggregates every hourly snapshot within the UTC day containing `at` for
/// `project` into a `DailyRollup`, and upserts it.
///
/// Idempotent: re-running with the same inputs recomputes the same sums
/// from source data and bumps `rollup_version`, which is how gap-fill
/// (delete then re-run) and routine re-aggregation are told apart by a
/// reader — both land at the same `(date, project)` row.
pub async fn rollup_daily(
    warehouse: &dyn RelationalWarehouse,
    project: &str,
    at: DateTime<Utc>,
) -> Result<DailyRollup, RollupError> {
    let bucket = TimeBucket::daily(at);
    let date = bucket.canonical();

    let hourly = warehouse
        .list_hourly_snapshots(project, bucket.start(), bucket.end())
        .await?;

    let mut metrics = MetricBundle::new();
    let mut cost_usd = 0.0;
    for snapshot in &hourly {
        metrics += &snapshot.metrics;
        cost_usd += snapshot.cost_usd;
    }

    let rollup_version = warehouse
        .get_daily_rollup(&date, project)
        .await?
        .map_or(1, |existing| existing.rollup_version + 1);

    let row = DailyRollup {
        date,
        project: project.to_string(),
        metrics,
        cost_usd,
        rollup_version,
    };
    warehouse.upsert_daily_rollup(row.clone()).await?;
    Ok(row)
}

/// Aggregates every daily rollup within the UTC month containing `at` for
/// `project` into a `MonthlyRollup`, and upserts it.
pub async fn rollup_monthly(
    warehouse: &dyn RelationalWarehouse,
    project: &str,
    at: DateTime<Utc>,
) -> Result<MonthlyRollup, RollupError> {
    let bucket = TimeBucket::monthly(at);
    let month = bucket.canonical();
    let start_date = TimeBucket::daily(bucket.start()).canonical();
    let last_day_of_month = bucket.end() - chrono::Duration::days(1);
    let end_date = TimeBucket::daily(last_day_of_month).canonical();

    let daily = warehouse
        .list_daily_rollups(project, &start_date, &end_date)
        .await?;

    let mut metrics = MetricBundle::new();
    let mut cost_usd = 0.0;
    for rollup in &daily {
        metrics += &rollup.metrics;
        cost_usd += rollup.cost_usd;
    }

    let rollup_version = 1;
    let row = MonthlyRollup {
        month,
        project: project.to_string(),
        metrics,
        cost_usd,
        rollup_version,
    };
    warehouse.upsert_monthly_rollup(row.clone()).await?;
    Ok(row)
}

/// Deletes and rebuilds the daily rollup covering `at`, for when the
/// Collection Scheduler discovers a gap in upstream data and needs a clean
/// reconstruction rather than an additive patch.
pub async fn reconstruct_daily(
    warehouse: &dyn RelationalWarehouse,
    project: &str,
    at: DateTime<Utc>,
) -> Result<DailyRollup, RollupError> {
    let date = TimeBucket::daily(at).canonical();
    warehouse.delete_daily_rollup(&date, project).await?;
    rollup_daily(warehouse, project, at).await
}
