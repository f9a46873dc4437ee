// SPDX-License-Identifier: Apache-2.0

//! Cumulative-to-delta conversion.

use gov_config::PlatformSettings;
use gov_core::{MetricBundle, ResourceTag};

/// Computes `max(0, current - previous)` per resource, capped at the
/// configured `max_reasonable_delta` so a missing or stale prior reading
/// never books a full cumulative counter as a single hour's delta, and a
/// counter reset at the external source never produces a negative delta.
#[must_use]
pub fn compute_delta(current: &MetricBundle, previous: &MetricBundle, settings: &PlatformSettings) -> MetricBundle {
    let mut delta = MetricBundle::new();
    for tag in ResourceTag::ALL {
        let raw = current.get(tag) as i64 - previous.get(tag) as i64;
        let uncapped = raw.max(0) as u64;
        delta.set(tag, uncapped.min(settings.delta_cap(tag)));
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_increase_passes_through() {
        let mut current = MetricBundle::new();
        current.set(ResourceTag::RelationalWrites, 150);
        let mut previous = MetricBundle::new();
        previous.set(ResourceTag::RelationalWrites, 100);

        let delta = compute_delta(&current, &previous, &PlatformSettings::default());
        assert_eq!(delta.get(ResourceTag::RelationalWrites), 50);
    }

    #[test]
    fn missing_previous_is_capped_not_booked_whole() {
        let mut current = MetricBundle::new();
        current.set(ResourceTag::RelationalWrites, 50_000_000);
        let previous = MetricBundle::new();

        let settings = PlatformSettings::default();
        let delta = compute_delta(&current, &previous, &settings);
        assert_eq!(
            delta.get(ResourceTag::RelationalWrites),
            settings.delta_cap(ResourceTag::RelationalWrites)
        );
    }

    #[test]
    fn counter_reset_never_goes_negative() {
        let current = MetricBundle::new();
        let mut previous = MetricBundle::new();
        previous.set(ResourceTag::RelationalWrites, 1_000);

        let delta = compute_delta(&current, &previous, &PlatformSettings::default());
        assert_eq!(delta.get(ResourceTag::RelationalWrites), 0);
    }
}
