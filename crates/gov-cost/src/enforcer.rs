// SPDX-License-Identifier: Apache-2.0

//! Cost-Budget Enforcer: rolling 24h USD accumulation per feature,
//! tripping the shared circuit breaker on exceed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gov_budget::{CircuitBreaker, TripDetails};
use gov_core::FeatureKey;
use gov_kvcs::{keys, KeyValueControlStore, KvcsJsonExt};
use serde::{Deserialize, Serialize};

use crate::error::CostError;

/// The rolling-window cost budget for a feature, stored under
/// `CONFIG:FEATURE:{key}:COST_BUDGET`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBudget {
    /// Rolling-24h USD limit.
    pub daily_limit_usd: f64,
    /// Percent-of-limit at which a (non-tripping) warning should fire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_threshold_pct: Option<f64>,
}

/// `STATE:COST:{feature_key}:ACCUMULATED`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedCost {
    /// Accumulated USD cost within the current rolling window.
    pub cost_usd: f64,
    /// Window start, epoch milliseconds.
    pub window_start_ms: i64,
}

const ROLLING_WINDOW: chrono::Duration = chrono::Duration::hours(24);
/// KVCS TTL for the accumulated-cost cell: window + 1h headroom.
const ACCUMULATED_TTL: Duration = Duration::from_secs(25 * 3600);

/// Rounds `value` to 6 decimal places to prevent floating-point drift
/// across thousands of additions.
#[must_use]
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Evaluates and accumulates cost-budget state, tripping STOP on exceed.
pub struct CostBudgetEnforcer {
    kvcs: Arc<dyn KeyValueControlStore>,
    breaker: Arc<CircuitBreaker>,
    auto_reset_seconds: i64,
}

impl CostBudgetEnforcer {
    /// Builds a cost-budget enforcer sharing the given backends.
    #[must_use]
    pub fn new(kvcs: Arc<dyn KeyValueControlStore>, breaker: Arc<CircuitBreaker>, auto_reset_seconds: i64) -> Self {
        Self {
            kvcs,
            breaker,
            auto_reset_seconds,
        }
    }

    /// Adds `cost_usd` to `key`'s rolling 24h accumulation, resetting the
    /// window if the previous one has rolled over, and trips STOP if the
    /// running total exceeds the feature's configured `daily_limit_usd`.
    ///
    /// Returns the accumulated state after the update; the running total is
    /// nondecreasing within a window.
    pub async fn accumulate(
        &self,
        key: &FeatureKey,
        cost_usd: f64,
        now: DateTime<Utc>,
    ) -> Result<AccumulatedCost, CostError> {
        let prior = self
            .kvcs
            .get_json::<AccumulatedCost>(&keys::cost_accumulated(key))
            .await?;

        let updated = match prior {
            Some(prior) if now.timestamp_millis() - prior.window_start_ms < ROLLING_WINDOW.num_milliseconds() => {
                AccumulatedCost {
                    cost_usd: round6(prior.cost_usd + cost_usd),
                    window_start_ms: prior.window_start_ms,
                }
            }
            _ => AccumulatedCost {
                cost_usd: round6(cost_usd),
                window_start_ms: now.timestamp_millis(),
            },
        };

        self.kvcs
            .put_json(&keys::cost_accumulated(key), &updated, Some(ACCUMULATED_TTL))
            .await?;

        if let Some(budget) = self
            .kvcs
            .get_json::<CostBudget>(&keys::cost_budget(key))
            .await?
        {
            if updated.cost_usd > budget.daily_limit_usd {
                self.breaker
                    .trip(
                        key,
                        TripDetails {
                            reason: format!("cost_usd={}>{}", updated.cost_usd, budget.daily_limit_usd),
                            violated_resource: Some("cost_usd".to_string()),
                            current_value: Some(updated.cost_usd),
                            budget_limit: Some(budget.daily_limit_usd),
                            auto_reset_seconds: Some(self.auto_reset_seconds),
                        },
                        now,
                    )
                    .await?;
            }
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_budget::CircuitBreakerStatus;
    use gov_kvcs::InMemoryKvcs;
    use gov_warehouse::InMemoryWarehouse;

    fn feature() -> FeatureKey {
        FeatureKey::new("acme", "checkout", "stripe-charge").unwrap()
    }

    #[tokio::test]
    async fn trips_when_rolling_cost_exceeds_limit() {
        // COST_BUDGET {daily_limit_usd: 1.00}; cf 0.40 + external 0.65 => 1.05.
        let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
        let breaker = Arc::new(CircuitBreaker::new(kvcs.clone(), Arc::new(InMemoryWarehouse::new())));
        kvcs.put_json(
            &keys::cost_budget(&feature()),
            &CostBudget {
                daily_limit_usd: 1.00,
                alert_threshold_pct: None,
            },
            None,
        )
        .await
        .unwrap();
        let enforcer = CostBudgetEnforcer::new(kvcs, breaker.clone(), 900);
        let now = Utc::now();

        let after_first = enforcer.accumulate(&feature(), 0.40, now).await.unwrap();
        assert_eq!(after_first.cost_usd, 0.40);
        assert_eq!(breaker.status(&feature()).await.unwrap(), CircuitBreakerStatus::Go);

        let after_second = enforcer.accumulate(&feature(), 0.65, now).await.unwrap();
        assert!((after_second.cost_usd - 1.05).abs() < 1e-9);
        assert_eq!(breaker.status(&feature()).await.unwrap(), CircuitBreakerStatus::Stop);
    }

    #[tokio::test]
    async fn window_resets_after_24h() {
        let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
        let breaker = Arc::new(CircuitBreaker::new(kvcs.clone(), Arc::new(InMemoryWarehouse::new())));
        let enforcer = CostBudgetEnforcer::new(kvcs, breaker, 900);
        let now = Utc::now();
        let first = enforcer.accumulate(&feature(), 0.50, now).await.unwrap();
        assert_eq!(first.cost_usd, 0.50);
        let later = enforcer
            .accumulate(&feature(), 0.20, now + chrono::Duration::hours(25))
            .await
            .unwrap();
        assert_eq!(later.cost_usd, 0.20);
    }

    #[test]
    fn round6_truncates_drift() {
        assert_eq!(round6(0.1 + 0.2), 0.3);
    }
}
