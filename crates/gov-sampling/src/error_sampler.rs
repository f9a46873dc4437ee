// SPDX-License-Identifier: Apache-2.0

//! Adaptive Error Sampler: per-batch probabilistic down-sampling of
//! error *persistence* once the batch error rate crosses a trigger
//! threshold. Alert emission is independent of this decision — unsampled
//! errors still count toward rate thresholds.

use gov_core::ErrorCategory;
use rand::Rng;

/// Per-batch sampler state, owned by the Telemetry Consumer for the
/// lifetime of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchErrorSamplerState {
    /// Total errors observed so far this batch, across all categories.
    pub total_errors: u64,
    /// Errors actually persisted so far this batch.
    pub sampled_errors: u64,
    /// Total messages (error or not) observed so far this batch.
    pub total_messages: u64,
    /// True once the batch error rate has crossed `trigger_threshold`.
    pub sampling_active: bool,
}

impl BatchErrorSamplerState {
    /// An empty state for a new batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that one more message (of any kind) was processed. Must be
    /// called once per message before [`Self::decide`], even for
    /// error-free messages, since the trigger ratio is errors-over-total.
    pub fn observe_message(&mut self) {
        self.total_messages += 1;
    }

    /// Current batch error rate, `total_errors / total_messages`, or `0.0`
    /// before any messages have been observed.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.total_messages == 0 {
            0.0
        } else {
            self.total_errors as f64 / self.total_messages as f64
        }
    }

    /// Decides whether an error in `category` should be persisted.
    ///
    /// `NEVER_SAMPLE` categories are always persisted regardless of rate
    ///. Otherwise: persist unconditionally while the
    /// rate is below `trigger_threshold`; once at or above it, engage
    /// sampling and persist with probability `sample_rate`.
    pub fn decide(
        &mut self,
        category: ErrorCategory,
        trigger_threshold: f64,
        sample_rate: f64,
        rng: &mut impl Rng,
    ) -> bool {
        self.total_errors += 1;

        if category.is_never_sampled() {
            self.sampled_errors += 1;
            return true;
        }

        if self.error_rate() < trigger_threshold {
            self.sampled_errors += 1;
            return true;
        }

        self.sampling_active = true;
        let persist = rng.random::<f64>() < sample_rate;
        if persist {
            self.sampled_errors += 1;
        }
        persist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn never_sample_categories_always_persist() {
        let mut state = BatchErrorSamplerState::new();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            state.observe_message();
            assert!(state.decide(ErrorCategory::CircuitBreaker, 0.0, 0.0, &mut rng));
        }
    }

    #[test]
    fn low_rate_persists_unconditionally() {
        let mut state = BatchErrorSamplerState::new();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            state.observe_message();
        }
        assert!(state.decide(ErrorCategory::Validation, 0.10, 0.10, &mut rng));
        assert!(!state.sampling_active);
    }

    /// In a batch of 200 with 60 VALIDATION errors, sampling_active flips
    /// once the rate crosses 0.10, and roughly `sample_rate * 60` are
    /// persisted, while every error still counts toward the rate.
    #[test]
    fn sampler_engages_and_samples_roughly_sample_rate() {
        const TRIGGER: f64 = 0.10;
        const SAMPLE_RATE: f64 = 0.10;
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = BatchErrorSamplerState::new();

        let mut persisted = 0u32;
        for i in 0..200 {
            state.observe_message();
            if i < 60 {
                if state.decide(ErrorCategory::Validation, TRIGGER, SAMPLE_RATE, &mut rng) {
                    persisted += 1;
                }
            }
        }

        assert!(state.sampling_active);
        assert_eq!(state.total_errors, 60);
        // All 60 counted toward the rate regardless of sampling decision.
        assert!((state.error_rate() - 60.0 / 200.0).abs() < 1e-9);
        // Roughly sample_rate * 60 ~= 6, loosely bounded for a single seeded run.
        assert!(persisted <= 20, "persisted {persisted} looks too high for a 10% sample rate");
    }
}
