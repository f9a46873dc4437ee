// SPDX-License-Identifier: Apache-2.0

//! Cost Calculator: maps a [`MetricBundle`] onto USD
//! using the [`PricingTable`].

use gov_core::MetricBundle;
use gov_pricing::PricingTable;

/// Computes the platform-side (cf-resource) USD cost of `bundle`.
///
/// Per-model inference counts are costed at the flat `InferenceUnits` unit
/// price, since the pricing table has no per-model breakdown — per-model
/// granularity is purely a usage-accounting dimension, not a
/// pricing one.
#[must_use]
pub fn calculate_cf_cost(bundle: &MetricBundle, pricing: &PricingTable) -> f64 {
    let mut total = 0.0;
    for (resource, count) in bundle.nonzero() {
        total += pricing.unit_price(resource) * (count as f64);
    }
    let per_model_total: u64 = bundle.per_model.values().sum();
    total += pricing.unit_price(gov_core::ResourceTag::InferenceUnits) * (per_model_total as f64);
    total
}

/// Combines the platform-side cost with an externally-reported cost.
#[must_use]
pub fn combine(cf_cost: f64, external_cost_usd: Option<f64>) -> f64 {
    cf_cost + external_cost_usd.unwrap_or(0.0)
}
