// SPDX-License-Identifier: Apache-2.0

//! The Budget Enforcer: per-resource rolling counters compared
//! against [`BudgetLimits`], tripping the circuit breaker on overrun.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gov_config::PlatformSettings;
use gov_core::time_bucket::CounterWindow;
use gov_core::{FeatureKey, MetricBundle};
use gov_kvcs::{keys, KeyValueControlStore, KvcsJsonExt};
use gov_warehouse::RelationalWarehouse;

use crate::circuit::{CircuitBreaker, TripDetails};
use crate::error::BudgetError;
use crate::limits::BudgetLimits;

/// One resource's trip outcome from a single [`BudgetEnforcer::evaluate`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTrip {
    /// The resource that exceeded its budget.
    pub resource: gov_core::ResourceTag,
    /// The window (hourly/daily) that was violated.
    pub window: CounterWindow,
    /// The accumulated value at trip time.
    pub current_value: u64,
    /// The configured limit (pre-multiplier).
    pub limit: u64,
}

/// Evaluates per-feature resource budgets on each telemetry message and
/// trips the shared circuit breaker when a hard limit is exceeded.
pub struct BudgetEnforcer {
    kvcs: Arc<dyn KeyValueControlStore>,
    warehouse: Arc<dyn RelationalWarehouse>,
    breaker: Arc<CircuitBreaker>,
    settings: Arc<PlatformSettings>,
}

impl BudgetEnforcer {
    /// Builds a budget enforcer sharing the given backends and settings.
    #[must_use]
    pub fn new(
        kvcs: Arc<dyn KeyValueControlStore>,
        warehouse: Arc<dyn RelationalWarehouse>,
        breaker: Arc<CircuitBreaker>,
        settings: Arc<PlatformSettings>,
    ) -> Self {
        Self {
            kvcs,
            warehouse,
            breaker,
            settings,
        }
    }

    /// Resolves the live `BudgetLimits` for `key`: the KVCS cell if present,
    /// else the feature registry's default catalog entry, else unbounded.
    pub async fn resolve_limits(&self, key: &FeatureKey) -> Result<BudgetLimits, BudgetError> {
        if let Some(limits) = self.kvcs.get_json::<BudgetLimits>(&keys::budget(key)).await? {
            return Ok(limits);
        }
        if let Some(entry) = self.warehouse.get_feature_registry(&key.to_string()).await? {
            if let Ok(limits) = serde_json::from_str::<BudgetLimits>(&entry.daily_limits_json) {
                return Ok(limits);
            }
        }
        Ok(BudgetLimits::default())
    }

    /// Evaluates `bundle` against `key`'s resolved limits, updating rolling
    /// counters and tripping STOP on any resource exceeding
    /// `limit * hard_limit_multiplier`. Returns every trip that occurred
    /// (usually zero or one, but a single message can overrun more than one
    /// resource at once).
    pub async fn evaluate(
        &self,
        key: &FeatureKey,
        bundle: &MetricBundle,
        now: DateTime<Utc>,
    ) -> Result<Vec<ResourceTrip>, BudgetError> {
        let limits = self.resolve_limits(key).await?;
        let mut trips = Vec::new();

        for (resource, value) in bundle.nonzero() {
            if value == 0 {
                continue;
            }
            for window in [CounterWindow::Hourly, CounterWindow::Daily] {
                let Some(limit) = limits.limit(resource, window) else {
                    continue;
                };
                let counter_key = keys::counter(key, resource.as_str(), window.as_str());
                let ttl = Duration::from_secs(window.duration().num_seconds().max(0) as u64 * 2);
                let current = self.kvcs.incr_by(&counter_key, value as i64, Some(ttl)).await?;
                let current = current.max(0) as u64;

                let threshold = (limit as f64 * self.settings.hard_limit_multiplier).ceil() as u64;
                if current > threshold {
                    let reason = format!("{resource}={current}>{limit}");
                    self.breaker
                        .trip(
                            key,
                            TripDetails {
                                reason,
                                violated_resource: Some(resource.as_str().to_string()),
                                current_value: Some(current as f64),
                                budget_limit: Some(limit as f64),
                                auto_reset_seconds: Some(self.settings.cb_auto_reset_seconds),
                            },
                            now,
                        )
                        .await?;
                    trips.push(ResourceTrip {
                        resource,
                        window,
                        current_value: current,
                        limit,
                    });
                }
            }
        }

        Ok(trips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_core::ResourceTag;
    use gov_kvcs::InMemoryKvcs;
    use gov_warehouse::InMemoryWarehouse;

    fn feature() -> FeatureKey {
        FeatureKey::new("acme", "checkout", "stripe-charge").unwrap()
    }

    async fn enforcer_with_limit(hourly: u64) -> (BudgetEnforcer, Arc<CircuitBreaker>) {
        let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
        let warehouse: Arc<dyn RelationalWarehouse> = Arc::new(InMemoryWarehouse::new());
        let breaker = Arc::new(CircuitBreaker::new(kvcs.clone(), warehouse.clone()));
        let limits = BudgetLimits::new().with_limit(ResourceTag::RelationalWrites, Some(hourly), None);
        kvcs.put_json(&keys::budget(&feature()), &limits, None).await.unwrap();
        (
            BudgetEnforcer::new(kvcs, warehouse, breaker.clone(), Arc::new(PlatformSettings::default())),
            breaker,
        )
    }

    #[tokio::test]
    async fn trips_when_hard_limit_exceeded() {
        // budget {relational_writes: {hourly: 100}}, hard-limit x1.5; send 160 x 1.
        let (enforcer, breaker) = enforcer_with_limit(100).await;
        let mut bundle = MetricBundle::new();
        bundle.set(ResourceTag::RelationalWrites, 1);
        let now = Utc::now();

        let mut trips = Vec::new();
        for _ in 0..160 {
            trips.extend(enforcer.evaluate(&feature(), &bundle, now).await.unwrap());
        }

        assert_eq!(
            breaker.status(&feature()).await.unwrap(),
            crate::circuit::CircuitBreakerStatus::Stop
        );
        let trip = trips.first().expect("expected at least one trip");
        assert_eq!(trip.resource, ResourceTag::RelationalWrites);
        assert!(trip.current_value >= 150);
    }

    #[tokio::test]
    async fn stays_go_below_hard_limit() {
        let (enforcer, breaker) = enforcer_with_limit(100).await;
        let mut bundle = MetricBundle::new();
        bundle.set(ResourceTag::RelationalWrites, 1);
        let now = Utc::now();
        for _ in 0..90 {
            let trips = enforcer.evaluate(&feature(), &bundle, now).await.unwrap();
            assert!(trips.is_empty());
        }
        assert_eq!(
            breaker.status(&feature()).await.unwrap(),
            crate::circuit::CircuitBreakerStatus::Go
        );
    }
}
