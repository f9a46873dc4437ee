// SPDX-License-Identifier: Apache-2.0

//! The Query Service's multi-tier dashboard read path.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use gov_kvcs::KeyValueControlStore;
use gov_warehouse::model::DailyRollup;
use gov_warehouse::RelationalWarehouse;

use crate::analytics_engine::AnalyticsEngine;
use crate::cache;
use crate::error::QueryError;
use crate::tiers::{dedup_by_date, SourceTier};

/// The result of a dashboard range query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Daily rollup rows covering the requested range, sorted by date.
    pub rows: Vec<DailyRollup>,
    /// Which backend(s) served the data.
    pub tier: SourceTier,
    /// Set when the response is degraded-but-served: empty data with an
    /// explanation, rather than an error.
    pub note: Option<String>,
}

/// Serves dashboard range queries by preferring the external analytics
/// engine within its retention window and falling back to the warehouse's
/// daily rollups outside that window or on analytics-engine failure.
pub struct QueryService {
    warehouse: std::sync::Arc<dyn RelationalWarehouse>,
    kvcs: std::sync::Arc<dyn KeyValueControlStore>,
    analytics_engine: Option<std::sync::Arc<dyn AnalyticsEngine>>,
}

impl QueryService {
    /// Builds a query service. `analytics_engine` is optional: a deployment
    /// with none configured serves every query from the warehouse tier.
    #[must_use]
    pub fn new(
        warehouse: std::sync::Arc<dyn RelationalWarehouse>,
        kvcs: std::sync::Arc<dyn KeyValueControlStore>,
        analytics_engine: Option<std::sync::Arc<dyn AnalyticsEngine>>,
    ) -> Self {
        Self {
            warehouse,
            kvcs,
            analytics_engine,
        }
    }

    /// Queries daily rollups for `project` over `[start_date, end_date]`
    /// (inclusive, `YYYY-MM-DD`), applying the multi-tier fallback.
    pub async fn query_range(
        &self,
        project: &str,
        start_date: &str,
        end_date: &str,
        now: DateTime<Utc>,
    ) -> Result<QueryResult, QueryError> {
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        if start > end {
            return Err(QueryError::InvalidRange(format!("{start_date} is after {end_date}")));
        }

        let Some((ae, retention_cutoff)) = self
            .analytics_engine
            .as_ref()
            .map(|ae| (ae.clone(), (now - ae.retention()).date_naive()))
        else {
            let rows = self.warehouse_range(project, start, end).await?;
            let tier = SourceTier::combine(false, !rows.is_empty());
            return Ok(finish(rows, tier));
        };

        // Step 1/2: split the range into the sub-range within the
        // analytics engine's retention and the sub-range outside it.
        let (outside, inside) = split_at_retention(start, end, retention_cutoff);

        let mut ae_rows = Vec::new();
        let mut ae_used = false;
        let mut ae_failed_range = None;
        if let Some((inside_start, inside_end)) = inside {
            match ae
                .query_range(project, &fmt_date(inside_start), &fmt_date(inside_end))
                .await
            {
                Ok(rows) => {
                    ae_used = true;
                    ae_rows = rows;
                }
                Err(err) => {
                    tracing::warn!(project, %err, "analytics-engine query failed, falling back to warehouse");
                    ae_failed_range = Some((inside_start, inside_end));
                }
            }
        }

        // Step 2/3: warehouse covers whatever the analytics engine didn't:
        // the outside-retention segment, plus the inside segment on AE failure.
        let mut d1_rows = Vec::new();
        let mut d1_used = false;
        if let Some((os, oe)) = outside {
            d1_rows.extend(self.warehouse_range(project, os, oe).await?);
            d1_used = true;
        }
        if let Some((fs, fe)) = ae_failed_range {
            d1_rows.extend(self.warehouse_range(project, fs, fe).await?);
            d1_used = true;
        }

        let rows = dedup_by_date(ae_rows, d1_rows);
        let tier = SourceTier::combine(ae_used, d1_used);
        Ok(finish(rows, tier))
    }

    async fn warehouse_range(&self, project: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyRollup>, QueryError> {
        let mut rows = Vec::new();
        let mut day = start;
        while day <= end {
            let date = fmt_date(day);
            if let Some(cached) = cache::get(self.kvcs.as_ref(), &date, project).await? {
                rows.push(cached);
            }
            day += ChronoDuration::days(1);
        }
        if rows.len() == (end - start).num_days() as usize + 1 {
            return Ok(rows);
        }

        // At least one date missed the cache: fetch the whole range from
        // the warehouse (simpler and no less correct than patching gaps
        // one date at a time) and repopulate the cache cells we can.
        let fetched = self
            .warehouse
            .list_daily_rollups(project, &fmt_date(start), &fmt_date(end))
            .await?;
        for row in &fetched {
            cache::put(self.kvcs.as_ref(), &row.date, project, row).await?;
        }
        Ok(fetched)
    }
}

fn finish(rows: Vec<DailyRollup>, tier: SourceTier) -> QueryResult {
    let note = if rows.is_empty() {
        Some("no data available for the requested range".to_string())
    } else {
        None
    };
    QueryResult { rows, tier, note }
}

/// Splits `[start, end]` at `retention_cutoff` into an (outside-retention,
/// inside-retention) pair of sub-ranges, either of which may be absent.
fn split_at_retention(
    start: NaiveDate,
    end: NaiveDate,
    retention_cutoff: NaiveDate,
) -> (Option<(NaiveDate, NaiveDate)>, Option<(NaiveDate, NaiveDate)>) {
    if end < retention_cutoff {
        (Some((start, end)), None)
    } else if start >= retention_cutoff {
        (None, Some((start, end)))
    } else {
        (Some((start, retention_cutoff - ChronoDuration::days(1))), Some((retention_cutoff, end)))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| QueryError::InvalidRange(format!("malformed date {s:?}")))
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gov_core::MetricBundle;
    use gov_kvcs::InMemoryKvcs;
    use gov_warehouse::InMemoryWarehouse;
    use std::sync::Arc;

    use crate::analytics_engine::AnalyticsEngineError;

    struct FixedAnalyticsEngine {
        rows: Vec<DailyRollup>,
        fail: bool,
    }

    #[async_trait]
    impl AnalyticsEngine for FixedAnalyticsEngine {
        fn retention(&self) -> ChronoDuration {
            ChronoDuration::days(7)
        }

        async fn query_range(&self, _project: &str, _start: &str, _end: &str) -> Result<Vec<DailyRollup>, AnalyticsEngineError> {
            if self.fail {
                Err(AnalyticsEngineError::QueryFailed("unavailable".to_string()))
            } else {
                Ok(self.rows.clone())
            }
        }
    }

    fn row(date: &str) -> DailyRollup {
        DailyRollup {
            date: date.to_string(),
            project: "acme".to_string(),
            metrics: MetricBundle::new(),
            cost_usd: 1.0,
            rollup_version: 1,
        }
    }

    #[tokio::test]
    async fn entirely_within_retention_serves_from_analytics_engine_only() {
        let warehouse: Arc<dyn RelationalWarehouse> = Arc::new(InMemoryWarehouse::new());
        let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
        let ae: Arc<dyn AnalyticsEngine> = Arc::new(FixedAnalyticsEngine {
            rows: vec![row("2026-07-28")],
            fail: false,
        });
        let service = QueryService::new(warehouse, kvcs, Some(ae));
        let now = Utc::now();
        let result = service.query_range("acme", "2026-07-28", "2026-07-28", now).await.unwrap();
        assert_eq!(result.tier, SourceTier::Ae);
        assert_eq!(result.rows.len(), 1);
    }

    #[tokio::test]
    async fn range_outside_retention_falls_back_to_warehouse() {
        let warehouse = InMemoryWarehouse::new();
        warehouse.upsert_daily_rollup(row("2026-06-01")).await.unwrap();
        let warehouse: Arc<dyn RelationalWarehouse> = Arc::new(warehouse);
        let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
        let ae: Arc<dyn AnalyticsEngine> = Arc::new(FixedAnalyticsEngine { rows: vec![], fail: false });
        let service = QueryService::new(warehouse, kvcs, Some(ae));
        let now = Utc::now();
        let result = service.query_range("acme", "2026-06-01", "2026-06-01", now).await.unwrap();
        assert_eq!(result.tier, SourceTier::D1);
        assert_eq!(result.rows.len(), 1);
    }

    #[tokio::test]
    async fn analytics_engine_failure_falls_back_and_is_still_served() {
        let warehouse = InMemoryWarehouse::new();
        warehouse.upsert_daily_rollup(row("2026-07-28")).await.unwrap();
        let warehouse: Arc<dyn RelationalWarehouse> = Arc::new(warehouse);
        let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
        let ae: Arc<dyn AnalyticsEngine> = Arc::new(FixedAnalyticsEngine { rows: vec![], fail: true });
        let service = QueryService::new(warehouse, kvcs, Some(ae));
        let now = Utc::now();
        let result = service.query_range("acme", "2026-07-28", "2026-07-28", now).await.unwrap();
        assert_eq!(result.tier, SourceTier::D1);
        assert_eq!(result.rows.len(), 1);
    }

    #[tokio::test]
    async fn empty_result_is_served_with_a_note_not_an_error() {
        let warehouse: Arc<dyn RelationalWarehouse> = Arc::new(InMemoryWarehouse::new());
        let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
        let service = QueryService::new(warehouse, kvcs, None);
        let now = Utc::now();
        let result = service.query_range("acme", "2026-07-01", "2026-07-02", now).await.unwrap();
        assert_eq!(result.tier, SourceTier::None);
        assert!(result.note.is_some());
    }
}
