// SPDX-License-Identifier: Apache-2.0

//! The KVCS-backed PID throttle controller.

use std::time::Duration;

use gov_core::FeatureKey;
use gov_kvcs::{keys, KeyValueControlStore, KvcsJsonExt};

use crate::error::ThrottleError;
use crate::pid::PIDState;

/// TTL for `STATE:PID:{feature_key}`.
const PID_TTL: Duration = Duration::from_secs(24 * 3600);

/// Deployment rollout mode for the PID controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleMode {
    /// Compute and log, but always persist `throttle_rate = 0`. The
    /// default for initial deployments.
    Shadow,
    /// Persist the computed `throttle_rate` for applications to read.
    Active,
}

impl Default for ThrottleMode {
    fn default() -> Self {
        ThrottleMode::Shadow
    }
}

/// Runs the PID loop for one feature, gated to at most once per
/// [`crate::pid::UPDATE_INTERVAL_MS`], persisting the result to KVCS.
///
/// Returns `None` if the update was skipped because the interval hasn't
/// elapsed (the caller should treat the feature's throttle rate as
/// whatever was last persisted).
pub async fn update(
    kvcs: &dyn KeyValueControlStore,
    key: &FeatureKey,
    bcu_batch_total: f64,
    budget_limit_bcu: f64,
    mode: ThrottleMode,
    now_ms: i64,
) -> Result<Option<PIDState>, ThrottleError> {
    let prior = kvcs
        .get_json::<PIDState>(&keys::pid(key))
        .await?
        .unwrap_or_default();

    if prior.last_update_ms != 0 && !prior.due(now_ms) {
        return Ok(None);
    }

    let utilisation = if budget_limit_bcu > 0.0 {
        bcu_batch_total / budget_limit_bcu
    } else {
        0.0
    };

    let mut next = prior.step(utilisation, now_ms);
    if mode == ThrottleMode::Shadow {
        next.throttle_rate = 0.0;
    }

    kvcs.put_json(&keys::pid(key), &next, Some(PID_TTL)).await?;
    tracing::debug!(
        feature_key = %key,
        utilisation,
        throttle_rate = next.throttle_rate,
        mode = ?mode,
        "pid throttle update"
    );
    Ok(Some(next))
}
