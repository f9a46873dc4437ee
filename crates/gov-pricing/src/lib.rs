// SPDX-License-Identifier: Apache-2.0

//! Static pricing and allowance constants.
//!
//! Everything here is a compile-time-ish constant table, not a runtime
//! configuration value — per-deployment budget *limits* live in
//! `gov-budget`'s `BudgetLimits`, sourced from KVCS/the feature registry.
//! This crate answers "what does one unit of resource `r` cost, and how
//! much of it comes free on a given plan", which [`gov_cost`] and
//! [`gov_bcu`] build on.

use std::collections::BTreeMap;

use gov_core::ResourceTag;

/// Billing plan tier, used to select a free-tier allowance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plan {
    /// The free tier.
    Free,
    /// A paid plan (allowances are additive on top of the free tier in
    /// most billing models; here we treat the paid allowance as the
    /// effective total, matching the "free-tier & paid-plan
    /// allowances" phrasing as two independent rows).
    Paid,
}

/// Per-unit USD price for each resource tag.
#[derive(Debug, Clone)]
pub struct PricingTable {
    unit_price_usd: BTreeMap<ResourceTag, f64>,
}

impl PricingTable {
    /// The USD price of one unit of `resource`, or `0.0` if the resource
    /// has no associated cost (e.g. it's purely a BCU-scarcity signal).
    #[must_use]
    pub fn unit_price(&self, resource: ResourceTag) -> f64 {
        self.unit_price_usd.get(&resource).copied().unwrap_or(0.0)
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        use ResourceTag::*;
        Self {
            unit_price_usd: BTreeMap::from([
                (RelationalWrites, 0.000_001_0),
                (RelationalReads, 0.000_000_2),
                (CacheReads, 0.000_000_05),
                (CacheWrites, 0.000_000_1),
                (CacheDeletes, 0.000_000_1),
                (CacheLists, 0.000_000_1),
                (ObjectClassA, 0.000_004_5),
                (ObjectClassB, 0.000_000_36),
                (InferenceUnits, 0.000_015_0),
                (InferenceRequests, 0.000_050_0),
                (QueueMessages, 0.000_000_4),
                (ComputeRequests, 0.000_002_0),
                (CpuMs, 0.000_012_5),
                (VectorQueries, 0.000_001_0),
                (VectorInserts, 0.000_002_0),
                (DoRequests, 0.000_001_5),
                (DoGbSeconds, 0.000_012_5),
                (WorkflowInvocations, 0.000_025_0),
            ]),
        }
    }
}

/// Free-tier / paid-plan monthly allowance (units included before the unit
/// price starts applying).
#[derive(Debug, Clone)]
pub struct AllowanceTable {
    by_plan: BTreeMap<PlanKey, BTreeMap<ResourceTag, u64>>,
}

// `Plan` itself isn't `Ord`; key the inner map on a small enum that is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PlanKey {
    Free,
    Paid,
}

impl From<Plan> for PlanKey {
    fn from(plan: Plan) -> Self {
        match plan {
            Plan::Free => PlanKey::Free,
            Plan::Paid => PlanKey::Paid,
        }
    }
}

impl AllowanceTable {
    /// The monthly allowance for `resource` under `plan`, in resource units.
    #[must_use]
    pub fn monthly_allowance(&self, plan: Plan, resource: ResourceTag) -> u64 {
        self.by_plan
            .get(&PlanKey::from(plan))
            .and_then(|m| m.get(&resource))
            .copied()
            .unwrap_or(0)
    }

    /// Units billable after subtracting the plan's free allowance.
    #[must_use]
    pub fn billable_units(&self, plan: Plan, resource: ResourceTag, used: u64) -> u64 {
        used.saturating_sub(self.monthly_allowance(plan, resource))
    }
}

impl Default for AllowanceTable {
    fn default() -> Self {
        use ResourceTag::*;
        let free = BTreeMap::from([
            (RelationalWrites, 100_000),
            (RelationalReads, 5_000_000),
            (CacheReads, 10_000_000),
            (CacheWrites, 1_000_000),
            (ObjectClassA, 1_000_000),
            (ObjectClassB, 10_000_000),
            (ComputeRequests, 100_000),
            (CpuMs, 400_000),
        ]);
        let paid = BTreeMap::from([
            (RelationalWrites, 25_000_000),
            (RelationalReads, 1_000_000_000),
            (CacheReads, 10_000_000_000),
            (CacheWrites, 1_000_000_000),
            (ObjectClassA, 10_000_000),
            (ObjectClassB, 1_000_000_000),
            (ComputeRequests, 10_000_000),
            (CpuMs, 30_000_000),
        ]);
        Self {
            by_plan: BTreeMap::from([(PlanKey::Free, free), (PlanKey::Paid, paid)]),
        }
    }
}

/// Hours in a 30-day month, used to pro-rate a monthly base cost down to an
/// hourly collection cycle.
pub const HOURS_PER_PRORATION_MONTH: f64 = 720.0;

/// Flat monthly base cost per resource (platform fees not captured by the
/// per-unit [`PricingTable`], e.g. a reserved-capacity or base-plan charge
/// attributed to a resource for rollup purposes).
#[derive(Debug, Clone, Default)]
pub struct MonthlyBaseCost {
    base_usd: BTreeMap<ResourceTag, f64>,
}

impl MonthlyBaseCost {
    /// The flat monthly USD base cost for `resource`, or `0.0` if unset.
    #[must_use]
    pub fn monthly_base(&self, resource: ResourceTag) -> f64 {
        self.base_usd.get(&resource).copied().unwrap_or(0.0)
    }

    /// The hourly pro-rated share of `resource`'s monthly base cost.
    #[must_use]
    pub fn hourly_prorated(&self, resource: ResourceTag) -> f64 {
        self.monthly_base(resource) / HOURS_PER_PRORATION_MONTH
    }
}

/// Static scarcity weights used by the BCU allocator (`gov_bcu`), kept here
/// because pricing and scarcity-weighting are grouped under the same
/// "Pricing & Allowance Table" component.
#[derive(Debug, Clone)]
pub struct ScarcityWeights {
    weight: BTreeMap<ResourceTag, f64>,
}

impl ScarcityWeights {
    /// The scarcity weight for `resource`, defaulting to `1.0` (neutral)
    /// for anything not explicitly weighted.
    #[must_use]
    pub fn weight(&self, resource: ResourceTag) -> f64 {
        self.weight.get(&resource).copied().unwrap_or(1.0)
    }
}

impl Default for ScarcityWeights {
    fn default() -> Self {
        use ResourceTag::*;
        Self {
            weight: BTreeMap::from([
                (RelationalWrites, 5.0),
                (RelationalReads, 1.0),
                (CacheReads, 0.2),
                (CacheWrites, 0.5),
                (CacheDeletes, 0.5),
                (CacheLists, 0.5),
                (ObjectClassA, 3.0),
                (ObjectClassB, 0.3),
                (InferenceUnits, 8.0),
                (InferenceRequests, 4.0),
                (QueueMessages, 0.4),
                (ComputeRequests, 1.5),
                (CpuMs, 0.02),
                (VectorQueries, 2.0),
                (VectorInserts, 3.0),
                (DoRequests, 1.2),
                (DoGbSeconds, 2.5),
                (WorkflowInvocations, 6.0),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpriced_resource_defaults_to_zero() {
        let table = PricingTable::default();
        assert!(table.unit_price(ResourceTag::CpuMs) > 0.0);
    }

    #[test]
    fn billable_units_subtracts_allowance_without_underflow() {
        let allowances = AllowanceTable::default();
        assert_eq!(
            allowances.billable_units(Plan::Free, ResourceTag::RelationalWrites, 50_000),
            0
        );
        assert_eq!(
            allowances.billable_units(Plan::Free, ResourceTag::RelationalWrites, 150_000),
            50_000
        );
    }

    #[test]
    fn unweighted_resource_is_neutral() {
        let weights = ScarcityWeights::default();
        assert_eq!(weights.weight(ResourceTag::WorkflowInvocations), 6.0);
    }

    #[test]
    fn monthly_base_cost_prorates_to_an_hour() {
        let mut table = MonthlyBaseCost::default();
        table.base_usd.insert(ResourceTag::DoGbSeconds, 720.0);
        assert_eq!(table.hourly_prorated(ResourceTag::DoGbSeconds), 1.0);
        assert_eq!(table.hourly_prorated(ResourceTag::CpuMs), 0.0);
    }
}
