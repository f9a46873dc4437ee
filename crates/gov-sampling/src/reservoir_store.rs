// SPDX-License-Identifier: Apache-2.0

//! KVCS-backed persistence for [`ReservoirState`] under `STATE:RESERVOIR:{key}`.

use std::time::Duration;

use gov_core::FeatureKey;
use gov_kvcs::{keys, KeyValueControlStore, KvcsJsonExt};

use crate::error::SamplingError;
use crate::reservoir::ReservoirState;

/// TTL for the reservoir cell.
const RESERVOIR_TTL: Duration = Duration::from_secs(24 * 3600);

/// Loads `key`'s reservoir, offers `value_ms` to it under Algorithm R, and
/// persists the result back. Called once per message with nonzero `cpu_ms`.
pub async fn record(
    kvcs: &dyn KeyValueControlStore,
    key: &FeatureKey,
    value: f64,
    capacity: usize,
    rng: &mut impl rand::Rng,
) -> Result<ReservoirState, SamplingError> {
    let mut state = kvcs
        .get_json::<ReservoirState>(&keys::reservoir(key))
        .await?
        .unwrap_or_default();
    state.add(value, capacity, rng);
    kvcs.put_json(&keys::reservoir(key), &state, Some(RESERVOIR_TTL))
        .await?;
    Ok(state)
}
