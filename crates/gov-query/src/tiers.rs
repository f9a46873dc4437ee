// SPDX-License-Identifier: Apache-2.0

//! Source-tier labeling and dedup-by-date concatenation.

use std::collections::BTreeMap;

use gov_warehouse::model::DailyRollup;

/// Which backend(s) contributed to a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SourceTier {
    /// Served entirely from the external analytics engine.
    #[serde(rename = "ae")]
    Ae,
    /// Served entirely from the warehouse's daily rollups.
    #[serde(rename = "d1")]
    D1,
    /// Served from both, concatenated.
    #[serde(rename = "ae+d1")]
    AeAndD1,
    /// Neither source returned anything for the requested range.
    #[serde(rename = "none")]
    None,
}

impl SourceTier {
    /// Combines two tier contributions (one from each backend, either of
    /// which may be empty/unused) into the overall response label.
    #[must_use]
    pub fn combine(ae_used: bool, d1_used: bool) -> Self {
        match (ae_used, d1_used) {
            (true, true) => SourceTier::AeAndD1,
            (true, false) => SourceTier::Ae,
            (false, true) => SourceTier::D1,
            (false, false) => SourceTier::None,
        }
    }
}

/// Concatenates `ae_rows` and `d1_rows`, deduplicating by date. When both
/// tiers return a row for the same date, the analytics-engine row wins
/// (it is the fresher, shorter-retention source); rows are returned sorted
/// by date ascending.
#[must_use]
pub fn dedup_by_date(ae_rows: Vec<DailyRollup>, d1_rows: Vec<DailyRollup>) -> Vec<DailyRollup> {
    let mut by_date: BTreeMap<String, DailyRollup> = BTreeMap::new();
    for row in d1_rows {
        let _ = by_date.insert(row.date.clone(), row);
    }
    for row in ae_rows {
        let _ = by_date.insert(row.date.clone(), row);
    }
    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_core::MetricBundle;

    fn row(date: &str, cost_usd: f64) -> DailyRollup {
        DailyRollup {
            date: date.to_string(),
            project: "acme".to_string(),
            metrics: MetricBundle::new(),
            cost_usd,
            rollup_version: 1,
        }
    }

    #[test]
    fn overlapping_date_prefers_the_analytics_engine_row() {
        let merged = dedup_by_date(vec![row("2026-07-28", 9.0)], vec![row("2026-07-28", 1.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].cost_usd, 9.0);
    }

    #[test]
    fn disjoint_dates_concatenate_sorted() {
        let merged = dedup_by_date(vec![row("2026-07-28", 1.0)], vec![row("2026-07-20", 2.0)]);
        assert_eq!(merged.iter().map(|r| r.date.as_str()).collect::<Vec<_>>(), vec!["2026-07-20", "2026-07-28"]);
    }

    #[test]
    fn tier_label_reflects_which_backends_contributed() {
        assert_eq!(SourceTier::combine(true, true), SourceTier::AeAndD1);
        assert_eq!(SourceTier::combine(true, false), SourceTier::Ae);
        assert_eq!(SourceTier::combine(false, true), SourceTier::D1);
        assert_eq!(SourceTier::combine(false, false), SourceTier::None);
    }
}
