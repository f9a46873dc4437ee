// SPDX-License-Identifier: Apache-2.0

//! Literal KVCS key-space builders.
//!
//! Every other crate that touches KVCS goes through these builders rather
//! than formatting key strings inline, so the key space stays centralized
//! and grep-able.

use gov_core::FeatureKey;

/// `CONFIG:FEATURE:{feature_key}:STATUS`
#[must_use]
pub fn status(key: &FeatureKey) -> String {
    format!("CONFIG:FEATURE:{key}:STATUS")
}

/// `CONFIG:FEATURE:{feature_key}:STATUS:REASON` (sidecar cell, not in the
/// reserved key list but required to carry the disabled-reason field
/// the status cell's "Sidecar cells" prose describes).
#[must_use]
pub fn status_reason(key: &FeatureKey) -> String {
    format!("CONFIG:FEATURE:{key}:STATUS:REASON")
}

/// `CONFIG:FEATURE:{feature_key}:STATUS:DISABLED_AT`
#[must_use]
pub fn status_disabled_at(key: &FeatureKey) -> String {
    format!("CONFIG:FEATURE:{key}:STATUS:DISABLED_AT")
}

/// `CONFIG:FEATURE:{feature_key}:STATUS:AUTO_RESET_AT`
#[must_use]
pub fn status_auto_reset_at(key: &FeatureKey) -> String {
    format!("CONFIG:FEATURE:{key}:STATUS:AUTO_RESET_AT")
}

/// `CONFIG:FEATURE:{feature_key}:BUDGET`
#[must_use]
pub fn budget(key: &FeatureKey) -> String {
    format!("CONFIG:FEATURE:{key}:BUDGET")
}

/// `CONFIG:FEATURE:{feature_key}:COST_BUDGET`
#[must_use]
pub fn cost_budget(key: &FeatureKey) -> String {
    format!("CONFIG:FEATURE:{key}:COST_BUDGET")
}

/// `STATE:COST:{feature_key}:ACCUMULATED`
#[must_use]
pub fn cost_accumulated(key: &FeatureKey) -> String {
    format!("STATE:COST:{key}:ACCUMULATED")
}

/// `STATE:RESERVOIR:{feature_key}`
#[must_use]
pub fn reservoir(key: &FeatureKey) -> String {
    format!("STATE:RESERVOIR:{key}")
}

/// `STATE:PID:{feature_key}`
#[must_use]
pub fn pid(key: &FeatureKey) -> String {
    format!("STATE:PID:{key}")
}

/// `CTR:{feature_key}:{resource}:{window}`
#[must_use]
pub fn counter(key: &FeatureKey, resource: &str, window: &str) -> String {
    format!("CTR:{key}:{resource}:{window}")
}

/// `CONFIG:SETTINGS:{name}`
#[must_use]
pub fn settings(name: &str) -> String {
    format!("CONFIG:SETTINGS:{name}")
}

/// `PREV_HOUR_ACCOUNT_METRICS`
pub const PREV_HOUR_ACCOUNT_METRICS: &str = "PREV_HOUR_ACCOUNT_METRICS";

/// `PREV_HOUR_PROJECT_METRICS:{project}`. Sidecar cell (not in the reserved
/// literal key list) carrying the same prior-cumulative-counter role as
/// [`PREV_HOUR_ACCOUNT_METRICS`], scoped per project so the scheduler can
/// delta each project independently before folding into the account total.
#[must_use]
pub fn prev_hour_project_metrics(project: &str) -> String {
    format!("PREV_HOUR_PROJECT_METRICS:{project}")
}

/// `CONFIG:GLOBAL:STATUS`, the platform-wide kill switch the Collection
/// Scheduler checks before starting an hourly cycle. Not in
/// the reserved key list; mirrors the per-feature `STATUS` cell's
/// `GO`/`STOP` shape at global scope.
pub const GLOBAL_STATUS: &str = "CONFIG:GLOBAL:STATUS";

/// `CTR:GLOBAL:relational-writes:daily`, the rolling 24h warehouse-write
/// counter the scheduler's sampling-mode gate reads to choose FULL / HALF /
/// QUARTER / MINIMAL cadence. Not itself a per-feature
/// counter, so it lives outside the `counter()` builder's key shape.
pub const GLOBAL_RELATIONAL_WRITES_24H: &str = "CTR:GLOBAL:relational-writes:daily";

/// `STATE:ALERT_DEDUP:{fingerprint}`. Not in the reserved key list,
/// but required to carry the "deduplicates by fingerprint" window the
/// Error Alerter's dedup check reads and writes.
#[must_use]
pub fn alert_dedup(fingerprint: &str) -> String {
    format!("STATE:ALERT_DEDUP:{fingerprint}")
}

/// `STATE:QUERY_CACHE:{date}:{project}`. Not in the reserved key
/// list, but required to carry the daily query-service cache cells the
/// Rollup Engine's "Cache invalidation" step deletes after each
/// daily rollup so the Query Service repopulates from canonical data.
#[must_use]
pub fn query_cache(date: &str, project: &str) -> String {
    format!("STATE:QUERY_CACHE:{date}:{project}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_status_key() {
        let key = FeatureKey::new("acme", "checkout", "stripe-charge").unwrap();
        assert_eq!(status(&key), "CONFIG:FEATURE:acme:checkout:stripe-charge:STATUS");
    }

    #[test]
    fn builds_counter_key() {
        let key = FeatureKey::new("acme", "checkout", "stripe-charge").unwrap();
        assert_eq!(
            counter(&key, "relational-writes", "hourly"),
            "CTR:acme:checkout:stripe-charge:relational-writes:hourly"
        );
    }

    #[test]
    fn builds_query_cache_key() {
        assert_eq!(query_cache("2026-07-28", "acme"), "STATE:QUERY_CACHE:2026-07-28:acme");
    }
}
