// SPDX-License-Identifier: Apache-2.0

//! The per-feature circuit-breaker state machine.
//!
//! States: `GO` (initial/default, implied by absence) and `STOP`.
//! Transitions: `GO -> STOP` on {resource trip, cost trip, manual disable};
//! `STOP -> GO` on {auto-reset at due time, manual enable}. `STOP` with no
//! `auto_reset_at` is persistent until a manual enable.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gov_core::FeatureKey;
use gov_kvcs::{KeyValueControlStore, KvcsJsonExt, keys};
use gov_warehouse::model::{CircuitBreakerEvent, CircuitBreakerEventType};
use gov_warehouse::RelationalWarehouse;
use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

/// Hot-path circuit-breaker status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitBreakerStatus {
    /// Default/absent state: requests proceed normally.
    Go,
    /// Tripped: applications must shed load (hard, 503-equivalent).
    Stop,
}

impl CircuitBreakerStatus {
    const GO_WIRE: &'static str = "GO";
    const STOP_WIRE: &'static str = "STOP";

    fn to_wire(self) -> &'static str {
        match self {
            CircuitBreakerStatus::Go => Self::GO_WIRE,
            CircuitBreakerStatus::Stop => Self::STOP_WIRE,
        }
    }

    fn from_wire(raw: &str) -> Self {
        if raw == Self::STOP_WIRE {
            CircuitBreakerStatus::Stop
        } else {
            CircuitBreakerStatus::Go
        }
    }
}

/// Sidecar metadata for a tripped feature.
#[derive(Debug, Clone, PartialEq)]
pub struct TripDetails {
    /// Why the breaker tripped, e.g. `"relational-writes=151>100"`.
    pub reason: String,
    /// Resource that was violated (`cost_usd` for a cost trip).
    pub violated_resource: Option<String>,
    /// The value observed at trip time.
    pub current_value: Option<f64>,
    /// The limit that was exceeded.
    pub budget_limit: Option<f64>,
    /// `Some` if the trip carries an automatic reset deadline.
    pub auto_reset_seconds: Option<i64>,
}

/// Reads and mutates per-feature circuit-breaker state in KVCS, and records
/// every transition as a warehouse event row.
pub struct CircuitBreaker {
    kvcs: Arc<dyn KeyValueControlStore>,
    warehouse: Arc<dyn RelationalWarehouse>,
}

impl CircuitBreaker {
    /// Builds a circuit breaker over the given KVCS and warehouse backends.
    #[must_use]
    pub fn new(kvcs: Arc<dyn KeyValueControlStore>, warehouse: Arc<dyn RelationalWarehouse>) -> Self {
        Self { kvcs, warehouse }
    }

    /// Reads the current status for `key`. Absence of the STATUS cell means GO.
    pub async fn status(&self, key: &FeatureKey) -> Result<CircuitBreakerStatus, BudgetError> {
        let raw = self.kvcs.get_raw(&keys::status(key)).await?;
        Ok(raw.map_or(CircuitBreakerStatus::Go, |v| CircuitBreakerStatus::from_wire(&v)))
    }

    /// Trips the breaker to STOP (automatic resource/cost trip path).
    pub async fn trip(
        &self,
        key: &FeatureKey,
        details: TripDetails,
        now: DateTime<Utc>,
    ) -> Result<(), BudgetError> {
        self.write_stop(key, &details.reason, details.auto_reset_seconds, now)
            .await?;
        self.warehouse
            .insert_circuit_breaker_event(CircuitBreakerEvent {
                id: uuid::Uuid::new_v4(),
                feature_key: key.to_string(),
                event_type: CircuitBreakerEventType::Trip,
                reason: details.reason,
                violated_resource: details.violated_resource,
                current_value: details.current_value,
                budget_limit: details.budget_limit,
                auto_reset: details.auto_reset_seconds.is_some(),
                alert_sent: false,
                created_at: now,
            })
            .await?;
        Ok(())
    }

    /// Administrator-initiated disable. No auto-reset deadline: persistent
    /// until a manual enable.
    pub async fn manual_disable(
        &self,
        key: &FeatureKey,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), BudgetError> {
        let reason = reason.into();
        self.write_stop(key, &reason, None, now).await?;
        self.warehouse
            .insert_circuit_breaker_event(CircuitBreakerEvent {
                id: uuid::Uuid::new_v4(),
                feature_key: key.to_string(),
                event_type: CircuitBreakerEventType::ManualDisable,
                reason,
                violated_resource: None,
                current_value: None,
                budget_limit: None,
                auto_reset: false,
                alert_sent: false,
                created_at: now,
            })
            .await?;
        Ok(())
    }

    /// Administrator-initiated enable, or the auto-reset sweep's action for
    /// one feature.
    pub async fn enable(
        &self,
        key: &FeatureKey,
        event_type: CircuitBreakerEventType,
        now: DateTime<Utc>,
    ) -> Result<(), BudgetError> {
        self.kvcs.delete(&keys::status(key)).await?;
        self.kvcs.delete(&keys::status_reason(key)).await?;
        self.kvcs.delete(&keys::status_disabled_at(key)).await?;
        self.kvcs.delete(&keys::status_auto_reset_at(key)).await?;
        self.warehouse
            .insert_circuit_breaker_event(CircuitBreakerEvent {
                id: uuid::Uuid::new_v4(),
                feature_key: key.to_string(),
                event_type,
                reason: "enabled".to_string(),
                violated_resource: None,
                current_value: None,
                budget_limit: None,
                auto_reset: false,
                alert_sent: false,
                created_at: now,
            })
            .await?;
        Ok(())
    }

    /// Manual-enable convenience wrapper around [`Self::enable`].
    pub async fn manual_enable(&self, key: &FeatureKey, now: DateTime<Utc>) -> Result<(), BudgetError> {
        self.enable(key, CircuitBreakerEventType::ManualEnable, now).await
    }

    /// Sweeps the given candidate feature keys (typically the feature
    /// registry) and clears STOP for any whose `auto_reset_at` is due.
    pub async fn auto_reset_sweep(
        &self,
        candidates: impl IntoIterator<Item = FeatureKey>,
        now: DateTime<Utc>,
    ) -> Result<Vec<FeatureKey>, BudgetError> {
        let mut reset = Vec::new();
        for key in candidates {
            if self.status(&key).await? != CircuitBreakerStatus::Stop {
                continue;
            }
            let Some(auto_reset_at) = self
                .kvcs
                .get_json::<DateTime<Utc>>(&keys::status_auto_reset_at(&key))
                .await?
            else {
                continue; // manual disable: no auto-reset deadline
            };
            if now >= auto_reset_at {
                self.enable(&key, CircuitBreakerEventType::Reset, now).await?;
                reset.push(key);
            }
        }
        Ok(reset)
    }

    async fn write_stop(
        &self,
        key: &FeatureKey,
        reason: &str,
        auto_reset_seconds: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<(), BudgetError> {
        self.kvcs
            .put_raw(&keys::status(key), CircuitBreakerStatus::Stop.to_wire().to_string(), None)
            .await?;
        self.kvcs
            .put_raw(&keys::status_reason(key), reason.to_string(), None)
            .await?;
        self.kvcs
            .put_json(&keys::status_disabled_at(key), &now, None)
            .await?;
        if let Some(seconds) = auto_reset_seconds {
            let auto_reset_at = now + chrono::Duration::seconds(seconds);
            self.kvcs
                .put_json(
                    &keys::status_auto_reset_at(key),
                    &auto_reset_at,
                    Some(Duration::from_secs(seconds.max(0) as u64 + 3600)),
                )
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_warehouse::InMemoryWarehouse;
    use gov_kvcs::InMemoryKvcs;

    fn feature() -> FeatureKey {
        FeatureKey::new("acme", "checkout", "stripe-charge").unwrap()
    }

    #[tokio::test]
    async fn default_status_is_go() {
        let breaker = CircuitBreaker::new(Arc::new(InMemoryKvcs::new()), Arc::new(InMemoryWarehouse::new()));
        assert_eq!(breaker.status(&feature()).await.unwrap(), CircuitBreakerStatus::Go);
    }

    #[tokio::test]
    async fn trip_then_auto_reset_when_due() {
        let breaker = CircuitBreaker::new(Arc::new(InMemoryKvcs::new()), Arc::new(InMemoryWarehouse::new()));
        let now = Utc::now();
        breaker
            .trip(
                &feature(),
                TripDetails {
                    reason: "relational-writes=151>100".to_string(),
                    violated_resource: Some("relational-writes".to_string()),
                    current_value: Some(151.0),
                    budget_limit: Some(100.0),
                    auto_reset_seconds: Some(60),
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(breaker.status(&feature()).await.unwrap(), CircuitBreakerStatus::Stop);

        let not_yet = breaker
            .auto_reset_sweep(vec![feature()], now + chrono::Duration::seconds(30))
            .await
            .unwrap();
        assert!(not_yet.is_empty());
        assert_eq!(breaker.status(&feature()).await.unwrap(), CircuitBreakerStatus::Stop);

        let reset = breaker
            .auto_reset_sweep(vec![feature()], now + chrono::Duration::seconds(61))
            .await
            .unwrap();
        assert_eq!(reset, vec![feature()]);
        assert_eq!(breaker.status(&feature()).await.unwrap(), CircuitBreakerStatus::Go);
    }

    #[tokio::test]
    async fn manual_disable_has_no_auto_reset() {
        let breaker = CircuitBreaker::new(Arc::new(InMemoryKvcs::new()), Arc::new(InMemoryWarehouse::new()));
        let now = Utc::now();
        breaker.manual_disable(&feature(), "maintenance", now).await.unwrap();
        let swept = breaker
            .auto_reset_sweep(vec![feature()], now + chrono::Duration::days(365))
            .await
            .unwrap();
        assert!(swept.is_empty());
        assert_eq!(breaker.status(&feature()).await.unwrap(), CircuitBreakerStatus::Stop);
    }
}
