// SPDX-License-Identifier: Apache-2.0

//! Algorithm-R reservoir sampler.
//!
//! O(1)-memory latency sampler: each of the `total_seen` values observed so
//! far has equal probability `N/total_seen` of being present in the
//! fixed-size sample once `total_seen > N`.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default reservoir capacity. The exact size is a
/// deployment tunable; 200 balances percentile accuracy against the
/// `STATE:RESERVOIR:*` KVCS payload size.
pub const DEFAULT_CAPACITY: usize = 200;

/// In-memory reservoir state, JSON-serialized into
/// `STATE:RESERVOIR:{feature_key}` with a 24h TTL by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservoirState {
    /// The current sample, length at most the configured capacity.
    pub samples: Vec<f64>,
    /// Total number of values ever offered to [`ReservoirState::add`].
    pub total_seen: u64,
}

impl ReservoirState {
    /// An empty reservoir.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers `value` to the reservoir under Algorithm R.
    ///
    /// If fewer than `capacity` values have been seen, `value` is appended
    /// unconditionally. Otherwise it replaces a uniformly-random existing
    /// slot with probability `capacity / total_seen`.
    pub fn add(&mut self, value: f64, capacity: usize, rng: &mut impl Rng) {
        self.total_seen += 1;
        if self.samples.len() < capacity {
            self.samples.push(value);
            return;
        }
        let j = rng.random_range(0..self.total_seen);
        if let Ok(slot) = usize::try_from(j) {
            if slot < capacity {
                self.samples[slot] = value;
            }
        }
    }

    /// The nearest-rank percentile `p` (in `[0, 100]`) over the current
    /// sample, or `None` if the reservoir is empty. Not cached: a fresh add
    /// calls for on-demand computation with cache invalidation on every add
    ///, which this crate's caller is responsible for (there is
    /// nothing to invalidate here since nothing is cached).
    #[must_use]
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let rank = ((p / 100.0) * (sorted.len() as f64 - 1.0)).round() as usize;
        Some(sorted[rank.min(sorted.len() - 1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fills_up_to_capacity_without_replacement() {
        let mut state = ReservoirState::new();
        let mut rng = StdRng::seed_from_u64(1);
        for i in 0..5 {
            state.add(i as f64, 10, &mut rng);
        }
        assert_eq!(state.samples.len(), 5);
        assert_eq!(state.total_seen, 5);
    }

    #[test]
    fn caps_sample_size_at_capacity() {
        let mut state = ReservoirState::new();
        let mut rng = StdRng::seed_from_u64(2);
        for i in 0..1000 {
            state.add(i as f64, 50, &mut rng);
        }
        assert_eq!(state.samples.len(), 50);
        assert_eq!(state.total_seen, 1000);
    }

    #[test]
    fn percentile_of_uniform_run_is_near_rank() {
        let mut state = ReservoirState::new();
        let mut rng = StdRng::seed_from_u64(3);
        for i in 0..100 {
            state.add(i as f64, 100, &mut rng);
        }
        assert_eq!(state.percentile(50.0), Some(49.0));
        assert_eq!(state.percentile(100.0), Some(99.0));
    }

    /// Statistical check of reservoir unbiasedness: over many independent
    /// runs, the fraction of runs in which a fixed
    /// early element survives to the end should track `capacity /
    /// total_seen`, within a generous tolerance for a modest trial count.
    #[test]
    fn selection_probability_tracks_capacity_over_total_seen() {
        const CAPACITY: usize = 20;
        const TOTAL: usize = 200;
        const TRIALS: usize = 2_000;
        let expected = CAPACITY as f64 / TOTAL as f64;

        let mut survived = 0u32;
        for trial in 0..TRIALS {
            let mut rng = StdRng::seed_from_u64(trial as u64);
            let mut state = ReservoirState::new();
            // element `0.0` is the first one offered; track whether it's
            // still present after the full stream.
            for i in 0..TOTAL {
                state.add(i as f64, CAPACITY, &mut rng);
            }
            if state.samples.contains(&0.0) {
                survived += 1;
            }
        }
        let observed = f64::from(survived) / TRIALS as f64;
        assert!(
            (observed - expected).abs() < 0.03,
            "observed {observed}, expected {expected}"
        );
    }
}
