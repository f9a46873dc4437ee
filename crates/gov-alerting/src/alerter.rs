// SPDX-License-Identifier: Apache-2.0

//! The Error Alerter: wires classification, fingerprinting,
//! escalation, persistence, and best-effort delivery together.

use chrono::{DateTime, Utc};
use gov_config::PlatformSettings;
use gov_core::time_bucket::floor_to_window;
use gov_core::FeatureKey;
use gov_kvcs::KeyValueControlStore;
use gov_warehouse::model::ErrorEventRow;
use gov_warehouse::RelationalWarehouse;
use uuid::Uuid;

use gov_core::ErrorCategory;

use crate::classify::{self, RawError};
use crate::dedup;
use crate::delivery::{deliver_with_retry, AlertPayload, AlertSink};
use crate::error::AlertingError;
use crate::escalation::decide_priority;
use crate::fingerprint::{fingerprint, fingerprint_parts};

/// The Error Alerter: classifies a caught failure, records it, and
/// delivers a P0 alert immediately if escalation warrants it.
///
/// P1/P2 aggregate views are pulled on demand via [`crate::digest`], not
/// pushed from here — the scheduler's hourly/daily cadence
/// drives when those digests get emitted.
pub struct ErrorAlerter<'a> {
    warehouse: &'a dyn RelationalWarehouse,
    kvcs: &'a dyn KeyValueControlStore,
    sink: &'a dyn AlertSink,
    settings: &'a PlatformSettings,
}

impl<'a> ErrorAlerter<'a> {
    /// Builds an alerter over the given collaborators.
    pub fn new(
        warehouse: &'a dyn RelationalWarehouse,
        kvcs: &'a dyn KeyValueControlStore,
        sink: &'a dyn AlertSink,
        settings: &'a PlatformSettings,
    ) -> Self {
        Self {
            warehouse,
            kvcs,
            sink,
            settings,
        }
    }

    /// Classifies, fingerprints, persists, and (if P0) delivers an alert for
    /// one caught failure.
    ///
    /// This is called from the enforcement path and its
    /// errors are caught and logged by the caller rather than allowed to
    /// fail the originating message.
    pub async fn record_error(
        &self,
        feature_key: &FeatureKey,
        raw: &RawError,
        correlation_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AlertingError> {
        let category = classify::classify(raw);
        let code = classify::extract_code(raw);
        let fp = fingerprint(category, code.as_deref(), raw);
        self.finish(feature_key, category, code, correlation_id, fp, now).await
    }

    /// Records an error the caller already classified, skipping the
    /// [`classify::classify`] pass since there's no caught exception to
    /// classify from.
    pub async fn record_classified(
        &self,
        feature_key: &FeatureKey,
        category: ErrorCategory,
        code: Option<String>,
        correlation_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AlertingError> {
        let fp = fingerprint_parts(category, code.as_deref(), feature_key.as_canonical().as_str(), None);
        self.finish(feature_key, category, code, correlation_id, fp, now).await
    }

    async fn finish(
        &self,
        feature_key: &FeatureKey,
        category: ErrorCategory,
        code: Option<String>,
        correlation_id: Option<String>,
        fp: String,
        now: DateTime<Utc>,
    ) -> Result<(), AlertingError> {
        let window_start = floor_to_window(now, self.settings.error_rate_window_minutes);
        let window = self
            .warehouse
            .get_error_budget_window(&feature_key.as_canonical(), window_start)
            .await?;

        let priority = decide_priority(category, window.as_ref(), self.settings);

        self.warehouse
            .insert_error_event(ErrorEventRow {
                id: Uuid::new_v4(),
                feature_key: feature_key.as_canonical(),
                category,
                code: code.clone(),
                correlation_id,
                priority,
                created_at: now,
            })
            .await?;

        if priority == gov_warehouse::model::AlertPriority::P0
            && dedup::should_deliver(self.kvcs, &fp).await?
        {
            let payload = AlertPayload {
                feature_key: feature_key.as_canonical(),
                priority,
                summary: format!("{category:?} error in {feature_key} (code={code:?})"),
                fingerprint: fp,
            };
            deliver_with_retry(self.sink, &payload).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::LoggingSink;
    use gov_kvcs::InMemoryKvcs;
    use gov_warehouse::InMemoryWarehouse;

    fn feature() -> FeatureKey {
        FeatureKey::new("acme", "ai", "chat").unwrap()
    }

    #[tokio::test]
    async fn circuit_breaker_error_is_delivered_once() {
        let warehouse = InMemoryWarehouse::new();
        let kvcs = InMemoryKvcs::new();
        let sink = LoggingSink;
        let settings = PlatformSettings::default();
        let alerter = ErrorAlerter::new(&warehouse, &kvcs, &sink, &settings);

        let raw = RawError {
            type_name: "CircuitBreakerError".to_string(),
            message: "breaker open".to_string(),
            ..Default::default()
        };
        alerter
            .record_error(&feature(), &raw, None, Utc::now())
            .await
            .unwrap();

        let events = warehouse.list_error_events_since(Utc::now() - chrono::Duration::hours(1)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].priority, gov_warehouse::model::AlertPriority::P0);
    }

    #[tokio::test]
    async fn ordinary_validation_error_is_p1_and_not_delivered_twice() {
        let warehouse = InMemoryWarehouse::new();
        let kvcs = InMemoryKvcs::new();
        let sink = LoggingSink;
        let settings = PlatformSettings::default();
        let alerter = ErrorAlerter::new(&warehouse, &kvcs, &sink, &settings);

        let raw = RawError {
            type_name: "ValidationError".to_string(),
            message: "invalid payload".to_string(),
            ..Default::default()
        };
        alerter
            .record_error(&feature(), &raw, None, Utc::now())
            .await
            .unwrap();

        let events = warehouse
            .list_error_events_since(Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].priority, gov_warehouse::model::AlertPriority::P1);
    }
}
