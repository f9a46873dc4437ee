// SPDX-License-Identifier: Apache-2.0

//! The Heartbeat Handler: a zero-metric health probe
//! that must touch feature health and nothing else — no budget counters,
//! no circuit-breaker evaluation, no cost accumulation.

use chrono::{DateTime, Utc};
use gov_core::FeatureKey;
use gov_warehouse::model::FeatureHealth;
use gov_warehouse::RelationalWarehouse;

use crate::error::ConsumerError;

/// Upserts the heartbeat health row for `key`, marking it healthy as of `now`.
pub async fn handle(
    warehouse: &dyn RelationalWarehouse,
    key: &FeatureKey,
    now: DateTime<Utc>,
) -> Result<(), ConsumerError> {
    warehouse
        .upsert_feature_health(FeatureHealth {
            feature_key: key.as_canonical(),
            status: "healthy".to_string(),
            last_seen: now,
        })
        .await?;
    Ok(())
}
