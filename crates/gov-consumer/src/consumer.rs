// SPDX-License-Identifier: Apache-2.0

//! The Telemetry Consumer: the per-message pipeline from queue
//! message to warehouse facts, budget/cost enforcement, adaptive error
//! sampling, and alerting, plus the once-per-batch degradation pass
//! (reservoir + PID).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gov_alerting::{AlertSink, ErrorAlerter, LoggingSink, RawError};
use gov_budget::{BudgetEnforcer, CircuitBreaker};
use gov_config::settings::SamplingMode;
use gov_config::PlatformSettings;
use gov_core::time_bucket::floor_to_window;
use gov_core::{ErrorCategory, FeatureKey, MetricBundle, ResourceTag, TelemetryMessage, TimeBucket};
use gov_cost::{calculate_cf_cost, combine, CostBudgetEnforcer};
use gov_kvcs::KeyValueControlStore;
use gov_pricing::{PricingTable, ScarcityWeights};
use gov_sampling::BatchErrorSamplerState;
use gov_throttle::degradation::{self, FeatureBatchContribution};
use gov_throttle::ThrottleMode;
use gov_warehouse::RelationalWarehouse;
use rand::Rng;

use crate::heartbeat;

/// Fallback BCU budget for the degradation PID loop when a feature has no
/// resource limits configured to derive one from (no existing collaborator
/// publishes a BCU-denominated budget directly — see DESIGN.md).
const DEFAULT_BCU_BUDGET: f64 = 1_000.0;

/// What happened to one message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// Processed (or a no-op heartbeat) and safe to acknowledge.
    Acked,
    /// Failed in a way the queue should retry or dead-letter.
    Retry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Aggregate result of processing one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Total messages in the batch, including heartbeats.
    pub processed: usize,
    /// Messages acknowledged.
    pub acked: usize,
    /// Messages marked for retry.
    pub retried: usize,
    /// True if the adaptive error sampler engaged at any point this batch.
    pub sampler_engaged: bool,
}

/// Wires the Budget Enforcer, Cost-Budget Enforcer, Adaptive Error Sampler,
/// Error Alerter, and the reservoir/PID degradation loop together behind a
/// single per-batch entrypoint.
pub struct TelemetryConsumer {
    warehouse: Arc<dyn RelationalWarehouse>,
    kvcs: Arc<dyn KeyValueControlStore>,
    pricing: PricingTable,
    weights: ScarcityWeights,
    budget_enforcer: BudgetEnforcer,
    cost_enforcer: CostBudgetEnforcer,
    sink: Arc<dyn AlertSink>,
    settings: Arc<PlatformSettings>,
    throttle_mode: ThrottleMode,
}

impl TelemetryConsumer {
    /// Builds a consumer over shared KVCS/warehouse backends, delivering
    /// alerts via [`LoggingSink`]. Use [`Self::with_sink`] to plug in a real
    /// delivery channel.
    #[must_use]
    pub fn new(
        kvcs: Arc<dyn KeyValueControlStore>,
        warehouse: Arc<dyn RelationalWarehouse>,
        settings: Arc<PlatformSettings>,
        throttle_mode: ThrottleMode,
    ) -> Self {
        Self::with_sink(kvcs, warehouse, settings, throttle_mode, Arc::new(LoggingSink))
    }

    /// Builds a consumer with an explicit alert delivery channel.
    #[must_use]
    pub fn with_sink(
        kvcs: Arc<dyn KeyValueControlStore>,
        warehouse: Arc<dyn RelationalWarehouse>,
        settings: Arc<PlatformSettings>,
        throttle_mode: ThrottleMode,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(kvcs.clone(), warehouse.clone()));
        let budget_enforcer = BudgetEnforcer::new(kvcs.clone(), warehouse.clone(), breaker.clone(), settings.clone());
        let cost_enforcer = CostBudgetEnforcer::new(kvcs.clone(), breaker, settings.cb_auto_reset_seconds);
        Self {
            warehouse,
            kvcs,
            pricing: PricingTable::default(),
            weights: ScarcityWeights::default(),
            budget_enforcer,
            cost_enforcer,
            sink,
            settings,
            throttle_mode,
        }
    }

    /// Processes one batch end to end. Degradation (reservoir + PID) runs
    /// once per feature after every message has been accounted for, not per message.
    #[tracing::instrument(skip(self, messages, rng), fields(batch_size = messages.len()))]
    pub async fn process_batch(
        &self,
        messages: Vec<TelemetryMessage>,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            processed: messages.len(),
            ..Default::default()
        };
        let mut sampler = BatchErrorSamplerState::new();
        let mut contributions: HashMap<FeatureKey, FeatureBatchContribution> = HashMap::new();

        for message in &messages {
            sampler.observe_message();
            match self.process_message(message, now, &mut sampler, &mut contributions, rng).await {
                MessageOutcome::Acked => summary.acked += 1,
                MessageOutcome::Retry { reason } => {
                    summary.retried += 1;
                    tracing::warn!(feature_key = %message.feature_key, reason, "message marked for retry");
                }
            }
        }
        summary.sampler_engaged = sampler.sampling_active;

        for (key, contribution) in &contributions {
            let budget_limit_bcu = self.bcu_budget(key).await;
            if let Err(err) = degradation::apply(
                self.kvcs.as_ref(),
                key,
                contribution,
                budget_limit_bcu,
                self.throttle_mode,
                now.timestamp_millis(),
                rng,
            )
            .await
            {
                tracing::error!(feature_key = %key, error = %err, "degradation update failed");
            }
        }

        summary
    }

    async fn process_message(
        &self,
        message: &TelemetryMessage,
        now: DateTime<Utc>,
        sampler: &mut BatchErrorSamplerState,
        contributions: &mut HashMap<FeatureKey, FeatureBatchContribution>,
        rng: &mut impl Rng,
    ) -> MessageOutcome {
        let key = match message.validate() {
            Ok(key) => key,
            Err(err) => {
                self.record_malformed_message(message, &err.to_string(), now).await;
                return MessageOutcome::Retry { reason: err.to_string() };
            }
        };

        if message.is_heartbeat() {
            if let Err(err) = heartbeat::handle(self.warehouse.as_ref(), &key, now).await {
                tracing::error!(feature_key = %key, error = %err, "heartbeat upsert failed");
            }
            return MessageOutcome::Acked;
        }

        let time_bucket = TimeBucket::hourly(now).canonical();
        let cf_cost = calculate_cf_cost(&message.metrics, &self.pricing);
        let cost_usd = combine(cf_cost, message.external_cost_usd);

        if let Err(err) = self
            .warehouse
            .accumulate_hourly_snapshot(&time_bucket, key.project(), &message.metrics, cost_usd, SamplingMode::Full, now)
            .await
        {
            tracing::error!(feature_key = %key, error = %err, "hourly snapshot accumulation failed");
        }

        let bcu = gov_bcu::allocate(&message.metrics, &self.weights).total;
        contributions
            .entry(key.clone())
            .or_default()
            .observe(bcu, message.metrics.get(ResourceTag::CpuMs), message.timestamp_ms);

        if let Err(err) = self.budget_enforcer.evaluate(&key, &message.metrics, now).await {
            tracing::error!(feature_key = %key, error = %err, "budget enforcement failed");
        }

        if let Err(err) = self.cost_enforcer.accumulate(&key, cost_usd, now).await {
            tracing::error!(feature_key = %key, error = %err, "cost enforcement failed");
        }

        self.handle_errors(message, &key, sampler, now, rng).await;

        if !message.metrics.per_model.is_empty() {
            let date = TimeBucket::daily(now).canonical();
            for (model, count) in &message.metrics.per_model {
                if let Err(err) = self
                    .warehouse
                    .upsert_per_model_usage(&date, &key.as_canonical(), model, *count)
                    .await
                {
                    tracing::error!(feature_key = %key, model, error = %err, "per-model usage upsert failed");
                }
            }
        }

        MessageOutcome::Acked
    }

    async fn handle_errors(
        &self,
        message: &TelemetryMessage,
        key: &FeatureKey,
        sampler: &mut BatchErrorSamplerState,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) {
        let window_start = floor_to_window(now, self.settings.error_rate_window_minutes);

        if !message.has_errors() {
            if let Err(err) = self
                .warehouse
                .accumulate_error_budget_window(&key.as_canonical(), window_start, now, 1, 0, None)
                .await
            {
                tracing::error!(feature_key = %key, error = %err, "error-budget window accumulation failed");
            }
            return;
        }

        let category = message.error_category.unwrap_or(ErrorCategory::Internal);
        if let Err(err) = self
            .warehouse
            .accumulate_error_budget_window(&key.as_canonical(), window_start, now, 0, 1, Some(category))
            .await
        {
            tracing::error!(feature_key = %key, error = %err, "error-budget window accumulation failed");
        }

        // Every error counts toward the rate regardless of the sampling
        // decision below.
        let persist = sampler.decide(category, self.settings.error_rate_threshold, self.settings.error_sample_rate, rng);
        if !persist {
            return;
        }

        let alerter = ErrorAlerter::new(self.warehouse.as_ref(), self.kvcs.as_ref(), self.sink.as_ref(), self.settings.as_ref());
        let code = message.error_codes.first().cloned();
        if let Err(err) = alerter
            .record_classified(key, category, code, message.correlation_id.clone(), now)
            .await
        {
            tracing::error!(feature_key = %key, error = %err, "error alerting failed");
        }
    }

    /// Records a message whose `feature_key` failed to parse or didn't match
    /// `project`/`category`/`feature`. Best-effort:
    /// synthesizes a feature key from whatever components are usable so the
    /// failure still surfaces in the error stream, falling back to
    /// `unknown:unknown:unknown` rather than dropping it silently.
    async fn record_malformed_message(&self, message: &TelemetryMessage, reason: &str, now: DateTime<Utc>) {
        let project = if message.project.is_empty() { "unknown" } else { &message.project };
        let category = if message.category.is_empty() { "unknown" } else { &message.category };
        let feature = if message.feature.is_empty() { "unknown" } else { &message.feature };
        let Ok(key) = FeatureKey::new(project, category, feature) else {
            tracing::error!(feature_key = %message.feature_key, reason, "malformed message has no usable feature key, dropping");
            return;
        };

        let raw = RawError {
            type_name: "ValidationError".to_string(),
            message: reason.to_string(),
            ..Default::default()
        };
        let alerter = ErrorAlerter::new(self.warehouse.as_ref(), self.kvcs.as_ref(), self.sink.as_ref(), self.settings.as_ref());
        if let Err(err) = alerter.record_error(&key, &raw, message.correlation_id.clone(), now).await {
            tracing::error!(feature_key = %key, error = %err, "failed to record malformed-message failure");
        }
    }

    async fn bcu_budget(&self, key: &FeatureKey) -> f64 {
        match self.budget_enforcer.resolve_limits(key).await {
            Ok(limits) => {
                let mut bundle = MetricBundle::new();
                for (resource, limit) in &limits.resources {
                    if let Some(hourly) = limit.hourly {
                        bundle.set(*resource, hourly);
                    }
                }
                let allocation = gov_bcu::allocate(&bundle, &self.weights);
                if allocation.total > 0.0 {
                    allocation.total
                } else {
                    DEFAULT_BCU_BUDGET
                }
            }
            Err(err) => {
                tracing::error!(feature_key = %key, error = %err, "failed to resolve budget limits for degradation");
                DEFAULT_BCU_BUDGET
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_kvcs::InMemoryKvcs;
    use gov_warehouse::InMemoryWarehouse;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn consumer() -> TelemetryConsumer {
        TelemetryConsumer::new(
            Arc::new(InMemoryKvcs::new()),
            Arc::new(InMemoryWarehouse::new()),
            Arc::new(PlatformSettings::default()),
            ThrottleMode::Active,
        )
    }

    fn message(feature_key: &str, writes: u64) -> TelemetryMessage {
        let mut metrics = MetricBundle::new();
        metrics.set(ResourceTag::RelationalWrites, writes);
        let parts: Vec<&str> = feature_key.split(':').collect();
        TelemetryMessage {
            feature_key: feature_key.to_string(),
            project: parts[0].to_string(),
            category: parts[1].to_string(),
            feature: parts[2].to_string(),
            metrics,
            timestamp_ms: 1_000,
            is_heartbeat: None,
            error_count: None,
            error_category: None,
            error_codes: vec![],
            correlation_id: None,
            trace: None,
            request_duration_ms: Some(42.0),
            external_cost_usd: None,
        }
    }

    #[tokio::test]
    async fn heartbeat_touches_only_feature_health() {
        let consumer = consumer();
        let mut msg = message("acme:ai:chat", 0);
        msg.is_heartbeat = Some(true);
        let mut rng = StdRng::seed_from_u64(1);

        let summary = consumer.process_batch(vec![msg], Utc::now(), &mut rng).await;

        assert_eq!(summary.acked, 1);
        assert_eq!(consumer.kvcs.get_raw("anything").await.unwrap(), None);
        let health = consumer
            .warehouse
            .get_feature_health("acme:ai:chat")
            .await
            .unwrap();
        assert!(health.is_some());
    }

    #[tokio::test]
    async fn ordinary_message_accumulates_hourly_snapshot() {
        let consumer = consumer();
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(2);

        let summary = consumer.process_batch(vec![message("acme:ai:chat", 5)], now, &mut rng).await;

        assert_eq!(summary.acked, 1);
        let bucket = TimeBucket::hourly(now);
        let rows = consumer
            .warehouse
            .list_hourly_snapshots("acme", bucket.start(), bucket.end())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metrics.get(ResourceTag::RelationalWrites), 5);
    }

    #[tokio::test]
    async fn malformed_feature_key_is_retried_and_recorded() {
        let consumer = consumer();
        let mut msg = message("acme:ai:chat", 1);
        msg.feature = "other".to_string();
        let mut rng = StdRng::seed_from_u64(3);

        let summary = consumer.process_batch(vec![msg], Utc::now(), &mut rng).await;

        assert_eq!(summary.retried, 1);
        assert_eq!(summary.acked, 0);
        let events = consumer
            .warehouse
            .list_error_events_since(Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn degradation_runs_once_per_feature_after_batch() {
        let consumer = consumer();
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(4);

        let messages: Vec<_> = (0..5).map(|_| message("acme:ai:chat", 1)).collect();
        consumer.process_batch(messages, now, &mut rng).await;

        let pid = consumer
            .kvcs
            .get_raw(&gov_kvcs::keys::pid(&FeatureKey::new("acme", "ai", "chat").unwrap()))
            .await
            .unwrap();
        assert!(pid.is_some());
    }

    #[tokio::test]
    async fn errors_sample_adaptively_while_counting_toward_rate() {
        let consumer = consumer();
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(42);

        let mut messages = Vec::new();
        for i in 0..200 {
            let mut msg = message("acme:ai:chat", 1);
            if i < 60 {
                msg.error_count = Some(1);
                msg.error_category = Some(ErrorCategory::Validation);
            }
            messages.push(msg);
        }

        let summary = consumer.process_batch(messages, now, &mut rng).await;
        assert_eq!(summary.acked, 200);
        assert!(summary.sampler_engaged);

        let window_start = floor_to_window(now, consumer.settings.error_rate_window_minutes);
        let window = consumer
            .warehouse
            .get_error_budget_window("acme:ai:chat", window_start)
            .await
            .unwrap()
            .expect("window should exist");
        assert_eq!(window.error_count, 60);
        assert_eq!(window.success_count, 140);
    }

    #[tokio::test]
    async fn never_sample_category_is_always_persisted() {
        let consumer = consumer();
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(5);

        let mut messages = Vec::new();
        for _ in 0..50 {
            let mut msg = message("acme:ai:chat", 1);
            msg.error_count = Some(1);
            msg.error_category = Some(ErrorCategory::CircuitBreaker);
            messages.push(msg);
        }
        consumer.process_batch(messages, now, &mut rng).await;

        let events = consumer
            .warehouse
            .list_error_events_since(now - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(events.len(), 50);
    }
}
