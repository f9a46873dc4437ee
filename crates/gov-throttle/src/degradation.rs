// SPDX-License-Identifier: Apache-2.0

//! Intelligent-degradation orchestration.
//!
//! One call per feature seen in a batch amortizes the KVCS round trips: a
//! single reservoir update per sampled `cpu_ms` value, followed by at most
//! one PID update for the whole feature.

use gov_core::FeatureKey;
use gov_kvcs::KeyValueControlStore;
use gov_sampling::reservoir_store;
use gov_sampling::DEFAULT_CAPACITY;

use crate::controller::{self, ThrottleMode};
use crate::error::ThrottleError;
use crate::pid::PIDState;

/// What one feature contributed to a batch, accumulated by the Telemetry
/// Consumer while processing messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureBatchContribution {
    /// `cpu_ms` samples observed for this feature this batch, one per
    /// message that reported a nonzero `ResourceTag::CpuMs`.
    pub cpu_ms_samples: Vec<f64>,
    /// Total BCU consumed by this feature this batch.
    pub bcu_total: f64,
    /// Number of messages this feature contributed.
    pub message_count: u64,
    /// Epoch milliseconds of the last message seen for this feature.
    pub last_timestamp_ms: i64,
}

impl FeatureBatchContribution {
    /// Folds one message's BCU and `cpu_ms` observation into the running
    /// per-batch contribution. `cpu_ms` of zero means the message carried no
    /// CPU-ms metric and is not pushed into the reservoir.
    pub fn observe(&mut self, bcu: f64, cpu_ms: u64, timestamp_ms: i64) {
        self.bcu_total += bcu;
        self.message_count += 1;
        self.last_timestamp_ms = timestamp_ms;
        if cpu_ms != 0 {
            self.cpu_ms_samples.push(cpu_ms as f64);
        }
    }
}

/// Outcome of running degradation for one feature after a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegradationOutcome {
    /// The PID state after this batch, or `None` if the update interval
    /// hadn't elapsed and the PID step was skipped.
    pub pid: Option<PIDState>,
    /// Total reservoir observations recorded across this batch's samples.
    pub reservoir_total_seen: Option<u64>,
}

/// Applies reservoir and PID updates for one feature, once, after a batch
/// has been fully processed.
pub async fn apply(
    kvcs: &dyn KeyValueControlStore,
    key: &FeatureKey,
    contribution: &FeatureBatchContribution,
    budget_limit_bcu: f64,
    mode: ThrottleMode,
    now_ms: i64,
    rng: &mut impl rand::Rng,
) -> Result<DegradationOutcome, ThrottleError> {
    let mut reservoir_total_seen = None;
    for &sample in &contribution.cpu_ms_samples {
        let state = reservoir_store::record(kvcs, key, sample, DEFAULT_CAPACITY, rng).await?;
        reservoir_total_seen = Some(state.total_seen);
    }

    let pid = controller::update(kvcs, key, contribution.bcu_total, budget_limit_bcu, mode, now_ms).await?;

    Ok(DegradationOutcome {
        pid,
        reservoir_total_seen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_kvcs::InMemoryKvcs;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[tokio::test]
    async fn applies_reservoir_and_pid_together() {
        let kvcs = InMemoryKvcs::new();
        let key = FeatureKey::new("acme", "ai", "chat").unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut contribution = FeatureBatchContribution::default();
        for i in 0..10 {
            contribution.observe(5.0, i + 1, 1_000);
        }
        let outcome = apply(&kvcs, &key, &contribution, 10.0, ThrottleMode::Active, 1_000, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome.reservoir_total_seen, Some(10));
        assert!(outcome.pid.is_some());
    }
}
