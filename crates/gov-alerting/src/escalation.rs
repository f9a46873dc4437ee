// SPDX-License-Identifier: Apache-2.0

//! Escalation-tier assignment.

use gov_config::PlatformSettings;
use gov_core::ErrorCategory;
use gov_warehouse::model::{AlertPriority, ErrorBudgetWindow};

/// Decides the escalation tier for one observed error.
///
/// `window` is the feature's current sliding error-budget window, if one has
/// been accumulated yet. A `None`
/// window (first error ever seen for the feature) cannot trigger the
/// rate-based P0 path, only the category-based one.
///
/// Per-event classification only ever chooses between P0 and P1: P2 is a
/// daily-summary *view* over all events in the trailing 24h ([`crate::digest::daily_summary`]),
/// not a tier any single event is stamped with at record time.
#[must_use]
pub fn decide_priority(
    category: ErrorCategory,
    window: Option<&ErrorBudgetWindow>,
    settings: &PlatformSettings,
) -> AlertPriority {
    if category == ErrorCategory::CircuitBreaker {
        return AlertPriority::P0;
    }

    if let Some(window) = window {
        if window.total() >= settings.error_rate_min_requests
            && window.error_rate() >= settings.error_rate_threshold
        {
            return AlertPriority::P0;
        }
    }

    AlertPriority::P1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn window(success: u64, error: u64) -> ErrorBudgetWindow {
        ErrorBudgetWindow {
            feature_key: "acme:ai:chat".to_string(),
            window_start: Utc::now(),
            window_end: Utc::now(),
            success_count: success,
            error_count: error,
            per_category: HashMap::new(),
        }
    }

    #[test]
    fn circuit_breaker_is_always_p0() {
        let settings = PlatformSettings::default();
        assert_eq!(
            decide_priority(ErrorCategory::CircuitBreaker, None, &settings),
            AlertPriority::P0
        );
    }

    #[test]
    fn high_rate_with_enough_requests_is_p0() {
        let settings = PlatformSettings::default();
        let w = window(5, 20); // 25 total, 80% error rate, well above threshold/min_requests
        assert_eq!(
            decide_priority(ErrorCategory::Timeout, Some(&w), &settings),
            AlertPriority::P0
        );
    }

    #[test]
    fn high_rate_below_min_requests_is_p1() {
        let settings = PlatformSettings::default();
        let w = window(1, 2); // 3 total, below error_rate_min_requests default of 20
        assert_eq!(
            decide_priority(ErrorCategory::Timeout, Some(&w), &settings),
            AlertPriority::P1
        );
    }

    #[test]
    fn low_rate_is_p1() {
        let settings = PlatformSettings::default();
        let w = window(95, 5); // 100 total, 5% error rate
        assert_eq!(
            decide_priority(ErrorCategory::Timeout, Some(&w), &settings),
            AlertPriority::P1
        );
    }
}
