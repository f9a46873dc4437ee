// SPDX-License-Identifier: Apache-2.0

//! [`TelemetryMessage`]: the unit of work consumed off the telemetry queue.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::feature_key::FeatureKey;
use crate::metrics::MetricBundle;

/// Error taxonomy used throughout the platform.
///
/// This is a classification *kind*, not a concrete error type — the
/// alerting crate maps arbitrary application errors onto these categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Input/request validation failure.
    Validation,
    /// Network-layer failure (connection reset, DNS, etc).
    Network,
    /// The feature's circuit breaker was STOP when the request arrived.
    CircuitBreaker,
    /// Unclassified internal failure.
    Internal,
    /// Authentication/authorization failure.
    Auth,
    /// Caller exceeded a rate limit.
    RateLimit,
    /// Relational warehouse failure.
    Relational,
    /// Cache-layer failure.
    Cache,
    /// Queue-layer failure.
    Queue,
    /// A third-party/external API call failed.
    ExternalApi,
    /// An operation exceeded its deadline.
    Timeout,
}

impl ErrorCategory {
    /// Categories that the Adaptive Error Sampler must never drop.
    pub const NEVER_SAMPLE: [ErrorCategory; 3] = [
        ErrorCategory::CircuitBreaker,
        ErrorCategory::Auth,
        ErrorCategory::Internal,
    ];

    /// True if this category is exempt from adaptive sampling.
    #[must_use]
    pub fn is_never_sampled(&self) -> bool {
        Self::NEVER_SAMPLE.contains(self)
    }
}

/// W3C trace-context propagation fields plus the
/// platform's own correlation id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// W3C `traceparent` header value, if propagated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceparent: Option<String>,
    /// W3C `tracestate` header value, if propagated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracestate: Option<String>,
    /// Application-supplied correlation id (`x-correlation-id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Trace id, if already decoded from `traceparent` by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Span id, if already decoded from `traceparent` by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

/// One unit of work off the telemetry queue.
///
/// Invariant: `project:category:feature == feature_key` (checked by
/// [`TelemetryMessage::validate`], not by the constructor, since messages
/// typically arrive pre-built from queue deserialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryMessage {
    /// Canonical `project:category:feature` string, as sent by the producer.
    pub feature_key: String,
    /// Project component, duplicated for warehouse partitioning convenience.
    pub project: String,
    /// Category component.
    pub category: String,
    /// Feature component.
    pub feature: String,
    /// Resource usage for this invocation.
    #[serde(default)]
    pub metrics: MetricBundle,
    /// Producer-side timestamp, in epoch milliseconds.
    pub timestamp_ms: i64,
    /// True if this message is a zero-metric health probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_heartbeat: Option<bool>,
    /// Number of errors this invocation observed (0 if none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<u32>,
    /// Error category, if `error_count > 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    /// Raw error codes observed (HTTP status, errno, etc).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_codes: Vec<String>,
    /// Correlation id, duplicated at top level for convenience (also present in `trace`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Full trace-context payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceContext>,
    /// Wall-clock request duration, for reservoir sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_duration_ms: Option<f64>,
    /// Cost already charged by an external collaborator (e.g. a model provider
    /// invoice), added to the platform's own cost calculation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_cost_usd: Option<f64>,
}

impl TelemetryMessage {
    /// Parses `feature_key` into a [`FeatureKey`], and checks it matches the
    /// message's `project`/`category`/`feature` fields.
    pub fn validate(&self) -> Result<FeatureKey, CoreError> {
        let key: FeatureKey = self.feature_key.parse()?;
        let derived = format!("{}:{}:{}", self.project, self.category, self.feature);
        if self.feature_key != derived {
            return Err(CoreError::FeatureKeyMismatch {
                feature_key: self.feature_key.clone(),
                derived,
            });
        }
        Ok(key)
    }

    /// True if this message is a zero-metric heartbeat (default false).
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        self.is_heartbeat.unwrap_or(false)
    }

    /// True if this message reports at least one error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count.unwrap_or(0) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_message() -> TelemetryMessage {
        TelemetryMessage {
            feature_key: "acme:checkout:stripe-charge".to_string(),
            project: "acme".to_string(),
            category: "checkout".to_string(),
            feature: "stripe-charge".to_string(),
            metrics: MetricBundle::new(),
            timestamp_ms: 0,
            is_heartbeat: None,
            error_count: None,
            error_category: None,
            error_codes: vec![],
            correlation_id: None,
            trace: None,
            request_duration_ms: None,
            external_cost_usd: None,
        }
    }

    #[test]
    fn validates_matching_key() {
        let msg = base_message();
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn rejects_mismatched_key() {
        let mut msg = base_message();
        msg.feature = "other-feature".to_string();
        assert!(msg.validate().is_err());
    }

    #[test]
    fn heartbeat_defaults_false() {
        let msg = base_message();
        assert!(!msg.is_heartbeat());
    }
}
