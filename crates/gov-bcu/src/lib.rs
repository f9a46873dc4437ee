// SPDX-License-Identifier: Apache-2.0

//! Budget Consumption Unit (BCU) allocator.
//!
//! Maps a [`MetricBundle`] onto one scarcity-weighted scalar, with a
//! dominant-resource breakdown. `BCU(m) = Σ w_r · m_r`; additivity
//! (`BCU(m1) + BCU(m2) == BCU(m1 ⊕ m2)`) follows directly from the linearity
//! of the weighted sum and is checked in the tests below.

use gov_core::{MetricBundle, ResourceTag};
use gov_pricing::ScarcityWeights;
use serde::{Deserialize, Serialize};

/// The result of allocating BCU over a [`MetricBundle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BcuAllocation {
    /// Total BCU across all resources in the bundle.
    pub total: f64,
    /// The single resource contributing the most BCU, if the bundle was nonempty.
    pub dominant: Option<ResourceTag>,
    /// The dominant resource's share of `total`, as a percentage in `[0, 100]`.
    pub dominant_pct: f64,
}

/// Computes BCU for a [`MetricBundle`] under a [`ScarcityWeights`] table.
#[must_use]
pub fn allocate(bundle: &MetricBundle, weights: &ScarcityWeights) -> BcuAllocation {
    let mut total = 0.0;
    let mut dominant: Option<(ResourceTag, f64)> = None;

    for (resource, count) in bundle.nonzero() {
        let contribution = weights.weight(resource) * (count as f64);
        total += contribution;
        if dominant.is_none_or(|(_, max)| contribution > max) {
            dominant = Some((resource, contribution));
        }
    }

    let (dominant_tag, dominant_bcu) = match dominant {
        Some(d) => d,
        None => {
            return BcuAllocation {
                total: 0.0,
                dominant: None,
                dominant_pct: 0.0,
            };
        }
    };

    let dominant_pct = if total > 0.0 {
        100.0 * dominant_bcu / total
    } else {
        0.0
    };

    BcuAllocation {
        total,
        dominant: Some(dominant_tag),
        dominant_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bundle_has_zero_bcu() {
        let bundle = MetricBundle::new();
        let result = allocate(&bundle, &ScarcityWeights::default());
        assert_eq!(result.total, 0.0);
        assert!(result.dominant.is_none());
    }

    #[test]
    fn dominant_resource_is_the_largest_contributor() {
        let mut bundle = MetricBundle::new();
        bundle.set(ResourceTag::CpuMs, 100_000); // weight 0.02 -> 2000
        bundle.set(ResourceTag::RelationalWrites, 100); // weight 5.0 -> 500
        let result = allocate(&bundle, &ScarcityWeights::default());
        assert_eq!(result.dominant, Some(ResourceTag::CpuMs));
        assert!(result.dominant_pct > 50.0);
    }

    #[test]
    fn bcu_is_additive_over_combined_bundles() {
        let weights = ScarcityWeights::default();
        let mut a = MetricBundle::new();
        a.set(ResourceTag::RelationalWrites, 7);
        a.set(ResourceTag::CacheReads, 40);
        let mut b = MetricBundle::new();
        b.set(ResourceTag::RelationalWrites, 3);
        b.set(ResourceTag::InferenceUnits, 9);

        let bcu_a = allocate(&a, &weights).total;
        let bcu_b = allocate(&b, &weights).total;
        let combined = a.combined(&b);
        let bcu_combined = allocate(&combined, &weights).total;

        assert!((bcu_a + bcu_b - bcu_combined).abs() < 1e-9);
    }
}
