// SPDX-License-Identifier: Apache-2.0

//! `BudgetLimits` and the cost-budget sidecar shape stored under
//! `CONFIG:FEATURE:{key}:COST_BUDGET`.

use std::collections::BTreeMap;

use gov_core::ResourceTag;
use serde::{Deserialize, Serialize};

/// A per-resource limit pair: hourly and/or daily caps. Either may be
/// absent, meaning that window is unbounded for this resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimit {
    /// Hourly cap, in resource units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<u64>,
    /// Daily cap, in resource units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<u64>,
}

/// Per-feature resource budget, stored under `CONFIG:FEATURE:{key}:BUDGET`.
///
/// Source of truth is the live KVCS cell; when absent, the Budget Enforcer
/// falls back to the feature's registered catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimits {
    /// Per-resource hourly/daily caps.
    #[serde(default)]
    pub resources: BTreeMap<ResourceTag, ResourceLimit>,
}

impl BudgetLimits {
    /// An empty limit set (every resource unbounded).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both hourly and daily limits for a resource, builder-style.
    #[must_use]
    pub fn with_limit(mut self, resource: ResourceTag, hourly: Option<u64>, daily: Option<u64>) -> Self {
        self.resources.insert(resource, ResourceLimit { hourly, daily });
        self
    }

    /// The configured limit for `(resource, window)`, if any.
    #[must_use]
    pub fn limit(&self, resource: ResourceTag, window: gov_core::time_bucket::CounterWindow) -> Option<u64> {
        let limit = self.resources.get(&resource)?;
        match window {
            gov_core::time_bucket::CounterWindow::Hourly => limit.hourly,
            gov_core::time_bucket::CounterWindow::Daily => limit.daily,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_core::time_bucket::CounterWindow;

    #[test]
    fn limit_falls_back_to_none_for_unconfigured_resource() {
        let limits = BudgetLimits::new();
        assert_eq!(limits.limit(ResourceTag::CpuMs, CounterWindow::Hourly), None);
    }

    #[test]
    fn builder_sets_both_windows() {
        let limits = BudgetLimits::new().with_limit(ResourceTag::RelationalWrites, Some(100), Some(1000));
        assert_eq!(
            limits.limit(ResourceTag::RelationalWrites, CounterWindow::Hourly),
            Some(100)
        );
        assert_eq!(
            limits.limit(ResourceTag::RelationalWrites, CounterWindow::Daily),
            Some(1000)
        );
    }
}
