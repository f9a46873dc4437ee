// SPDX-License-Identifier: Apache-2.0

//! Exponential-backoff retry around the external collector pull.

use std::time::Duration;

use gov_core::MetricBundle;

use crate::collector::{CollectorError, ExternalMetricsCollector};

/// Retry delays, in order: 2s, 4s, 8s.
const BACKOFF_DELAYS: [Duration; 3] = [
    Duration::from_secs(2),
    Duration::from_secs(4),
    Duration::from_secs(8),
];

/// Pulls cumulative counters for `project`, retrying up to
/// `BACKOFF_DELAYS.len()` additional times on [`CollectorError::Transient`]
/// with exponential backoff. A credential error never retries.
pub async fn pull_with_backoff(
    collector: &dyn ExternalMetricsCollector,
    project: &str,
) -> Result<MetricBundle, (u32, CollectorError)> {
    let mut attempt = 0u32;
    loop {
        match collector.pull_cumulative_counters(project).await {
            Ok(bundle) => return Ok(bundle),
            Err(CollectorError::InvalidCredential(reason)) => {
                return Err((attempt + 1, CollectorError::InvalidCredential(reason)));
            }
            Err(err @ CollectorError::Transient(_)) => {
                if let Some(delay) = BACKOFF_DELAYS.get(attempt as usize) {
                    tracing::warn!(project, attempt, ?delay, "external collection pull failed, retrying");
                    tokio::time::sleep(*delay).await;
                    attempt += 1;
                } else {
                    return Err((attempt + 1, err));
                }
            }
        }
    }
}
