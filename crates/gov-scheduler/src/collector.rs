// SPDX-License-Identifier: Apache-2.0

//! The external telemetry source the Collection Scheduler pulls cumulative
//! counters from.
//!
//! The concrete backend (a metrics API, a cloud billing export, whatever a
//! deployment fronts) is an external collaborator; this crate only depends
//! on the shape of the interaction.

use async_trait::async_trait;
use gov_core::MetricBundle;

/// Errors an [`ExternalMetricsCollector`] implementation may raise.
#[derive(thiserror::Error, Debug, Clone)]
pub enum CollectorError {
    /// The configured credential was rejected.
    #[error("credential rejected: {0}")]
    InvalidCredential(String),
    /// A transient failure (network, rate limit, 5xx) that is worth retrying.
    #[error("transient collection failure: {0}")]
    Transient(String),
}

/// Source of cumulative per-project resource counters.
///
/// "Cumulative" means every call returns the running total since some
/// collector-side epoch, not a delta — turning that into an hourly delta is
/// the scheduler's job, not the collector's.
#[async_trait]
pub trait ExternalMetricsCollector: Send + Sync {
    /// Checks that the configured credential is still accepted by the
    /// external source, without pulling any counters.
    async fn validate_credential(&self, project: &str) -> Result<(), CollectorError>;

    /// Pulls the current cumulative counters for `project`.
    async fn pull_cumulative_counters(&self, project: &str) -> Result<MetricBundle, CollectorError>;
}
