// SPDX-License-Identifier: Apache-2.0

//! The external analytics-engine abstraction the Query Service's
//! multi-tier read path tries first.
//!
//! The concrete backend (a managed short-retention analytics datastore) is
//! an external collaborator, mirroring how `gov_scheduler::collector`
//! treats the external telemetry source: this crate only depends on the
//! shape of the interaction, not on any particular vendor.

use async_trait::async_trait;
use chrono::Duration;
use gov_warehouse::model::DailyRollup;

/// Errors an [`AnalyticsEngine`] implementation may raise.
///
/// Callers treat every variant as fail-open: a failure here never
/// propagates to the caller, it just forces a warehouse-tier read instead.
#[derive(thiserror::Error, Debug, Clone)]
pub enum AnalyticsEngineError {
    /// The query could not be served (timeout, unavailable, rejected).
    #[error("analytics engine query failed: {0}")]
    QueryFailed(String),
}

/// Source of short-retention daily aggregates for the dashboard's hot path.
#[async_trait]
pub trait AnalyticsEngine: Send + Sync {
    /// How far back this engine retains queryable data, from "now".
    fn retention(&self) -> Duration;

    /// Queries daily aggregates for `project` covering `[start_date,
    /// end_date]` (inclusive, `YYYY-MM-DD`), within the engine's retention.
    async fn query_range(
        &self,
        project: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DailyRollup>, AnalyticsEngineError>;
}
