// SPDX-License-Identifier: Apache-2.0

//! Alert delivery.
//!
//! The core platform defines only the payload shape and the retry
//! semantics; the concrete channel (service binding vs. webhook) is an
//! integration-time decision left to whatever implements [`AlertSink`].

use async_trait::async_trait;

use gov_warehouse::model::AlertPriority;

/// The payload handed to a concrete delivery channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    /// Feature the alert concerns.
    pub feature_key: String,
    /// Escalation tier.
    pub priority: AlertPriority,
    /// Human-readable summary line.
    pub summary: String,
    /// Fingerprint, for the receiving channel's own dedup/grouping.
    pub fingerprint: String,
}

/// A concrete alert delivery channel (service binding, webhook, etc).
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Attempts one delivery of `payload`. Errors are opaque strings since
    /// delivery failures are logged, never propagated or matched on.
    async fn deliver(&self, payload: &AlertPayload) -> Result<(), String>;
}

/// Delivers `payload` via `sink`, retrying once on failure and then giving
/// up (fail-open): a delivery failure never blocks or fails the consumer.
pub async fn deliver_with_retry(sink: &dyn AlertSink, payload: &AlertPayload) {
    if let Err(first_err) = sink.deliver(payload).await {
        tracing::warn!(feature_key = %payload.feature_key, error = %first_err, "alert delivery failed, retrying once");
        if let Err(second_err) = sink.deliver(payload).await {
            tracing::error!(feature_key = %payload.feature_key, error = %second_err, "alert delivery failed twice, giving up");
        }
    }
}

/// A sink that records delivered payloads in memory, for tests and for
/// local/dev deployments with no configured delivery channel.
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl AlertSink for LoggingSink {
    async fn deliver(&self, payload: &AlertPayload) -> Result<(), String> {
        tracing::info!(
            feature_key = %payload.feature_key,
            priority = ?payload.priority,
            fingerprint = %payload.fingerprint,
            "{}",
            payload.summary
        );
        Ok(())
    }
}
