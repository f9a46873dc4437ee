// SPDX-License-Identifier: Apache-2.0

//! The Anomaly Detector: flags a metric whose most recent daily
//! value deviates from its trailing rolling mean by more than
//! `deviation_factor` standard deviations, given enough history to trust
//! the estimate.

use chrono::{DateTime, Utc};
use gov_config::PlatformSettings;
use gov_core::TimeBucket;
use gov_warehouse::model::{AnomalyRecord, DailyRollup};
use gov_warehouse::RelationalWarehouse;
use uuid::Uuid;

use crate::error::RollupError;

/// Minimum trailing samples required before an anomaly can be declared.
const MIN_SAMPLES: usize = 3;
/// Trailing window, in days, used to compute the rolling mean/stddev.
const HISTORY_DAYS: i64 = 7;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Evaluates `metric_name` for `project` on the day containing `at` against
/// its trailing 7-day rolling mean/stddev, via `extract` (the projection
/// from a [`DailyRollup`] onto the metric being watched, e.g. `cost_usd` or
/// a specific resource count).
///
/// Returns `Ok(None)` when there isn't enough history, the metric is
/// constant over the window, or the deviation doesn't cross the
/// configured threshold. Deduplicates against any already-unresolved
/// anomaly for `(metric_name, project)` so a sustained deviation doesn't
/// spam a new row every day.
pub async fn detect_daily_anomaly(
    warehouse: &dyn RelationalWarehouse,
    settings: &PlatformSettings,
    project: &str,
    metric_name: &str,
    extract: impl Fn(&DailyRollup) -> f64,
    at: DateTime<Utc>,
) -> Result<Option<AnomalyRecord>, RollupError> {
    let today = TimeBucket::daily(at).canonical();
    let Some(current_row) = warehouse.get_daily_rollup(&today, project).await? else {
        return Ok(None);
    };
    let current_value = extract(&current_row);

    let history_start = TimeBucket::daily(at - chrono::Duration::days(HISTORY_DAYS)).canonical();
    let history_end = TimeBucket::daily(at - chrono::Duration::days(1)).canonical();
    let history = warehouse
        .list_daily_rollups(project, &history_start, &history_end)
        .await?;

    if history.len() < MIN_SAMPLES {
        return Ok(None);
    }

    let values: Vec<f64> = history.iter().map(&extract).collect();
    let rolling_avg = mean(&values);
    let rolling_stddev = stddev(&values, rolling_avg);
    // A perfectly flat history has zero stddev; fall back to a tiny epsilon
    // denominator so any departure from a constant baseline still registers
    // as a (large, finite) deviation rather than dividing by zero.
    let deviation_factor = (current_value - rolling_avg).abs() / rolling_stddev.max(f64::EPSILON);
    if deviation_factor < settings.deviation_factor {
        return Ok(None);
    }

    let unresolved = warehouse.list_unresolved_anomalies(metric_name, project).await?;
    if !unresolved.is_empty() {
        return Ok(None);
    }

    let record = AnomalyRecord {
        id: Uuid::new_v4(),
        detected_at: at,
        metric_name: metric_name.to_string(),
        project: project.to_string(),
        current_value,
        rolling_avg,
        rolling_stddev,
        deviation_factor,
        alert_sent: false,
        resolved: false,
    };
    warehouse.insert_anomaly(record.clone()).await?;
    Ok(Some(record))
}
