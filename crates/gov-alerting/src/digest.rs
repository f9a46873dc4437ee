// SPDX-License-Identifier: Apache-2.0

//! Aggregate alert views.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gov_core::ErrorCategory;
use gov_warehouse::model::AlertPriority;
use gov_warehouse::RelationalWarehouse;

use crate::error::AlertingError;

/// One `(feature_key, category)` group in the hourly digest.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestEntry {
    /// Feature the group concerns.
    pub feature_key: String,
    /// Error category common to the group.
    pub category: ErrorCategory,
    /// Number of events in the group.
    pub count: u64,
}

/// Aggregates non-P0 error events from the last hour, grouped by
/// `(feature_key, category)`, sorted descending by count and truncated to
/// `top_n`.
pub async fn hourly_digest(
    warehouse: &dyn RelationalWarehouse,
    now: DateTime<Utc>,
    top_n: usize,
) -> Result<Vec<DigestEntry>, AlertingError> {
    let since = now - chrono::Duration::hours(1);
    let events = warehouse.list_error_events_since(since).await?;
    let mut counts: HashMap<(String, ErrorCategory), u64> = HashMap::new();
    for event in events.iter().filter(|e| e.priority != AlertPriority::P0) {
        *counts
            .entry((event.feature_key.clone(), event.category))
            .or_insert(0) += 1;
    }
    let mut entries: Vec<DigestEntry> = counts
        .into_iter()
        .map(|((feature_key, category), count)| DigestEntry {
            feature_key,
            category,
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(top_n);
    Ok(entries)
}

/// A daily error summary.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    /// Total error events in the trailing 24h.
    pub total_events: u64,
    /// Number of distinct `(feature_key, category)` pairs observed.
    pub distinct_types: u64,
    /// The top `(feature_key, category)` groups by count.
    pub top: Vec<DigestEntry>,
}

/// Aggregates the last 24h of error events into a [`DailySummary`].
pub async fn daily_summary(
    warehouse: &dyn RelationalWarehouse,
    now: DateTime<Utc>,
    top_n: usize,
) -> Result<DailySummary, AlertingError> {
    let since = now - chrono::Duration::hours(24);
    let events = warehouse.list_error_events_since(since).await?;
    let mut counts: HashMap<(String, ErrorCategory), u64> = HashMap::new();
    for event in &events {
        *counts
            .entry((event.feature_key.clone(), event.category))
            .or_insert(0) += 1;
    }
    let distinct_types = counts.len() as u64;
    let mut top: Vec<DigestEntry> = counts
        .into_iter()
        .map(|((feature_key, category), count)| DigestEntry {
            feature_key,
            category,
            count,
        })
        .collect();
    top.sort_by(|a, b| b.count.cmp(&a.count));
    top.truncate(top_n);
    Ok(DailySummary {
        total_events: events.len() as u64,
        distinct_types,
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_warehouse::memory::InMemoryWarehouse;
    use uuid::Uuid;

    fn error_row(feature_key: &str, category: ErrorCategory, created_at: DateTime<Utc>) -> ErrorEventRow {
        ErrorEventRow {
            id: Uuid::new_v4(),
            feature_key: feature_key.to_string(),
            category,
            code: None,
            correlation_id: None,
            priority: AlertPriority::P1,
            created_at,
        }
    }

    #[tokio::test]
    async fn hourly_digest_groups_and_ranks() {
        let warehouse = InMemoryWarehouse::new();
        let now = Utc::now();
        for _ in 0..5 {
            warehouse
                .insert_error_event(error_row("acme:ai:chat", ErrorCategory::Timeout, now))
                .await
                .unwrap();
        }
        warehouse
            .insert_error_event(error_row("acme:ai:chat", ErrorCategory::Network, now))
            .await
            .unwrap();

        let digest = hourly_digest(&warehouse, now, 10).await.unwrap();
        assert_eq!(digest[0].category, ErrorCategory::Timeout);
        assert_eq!(digest[0].count, 5);
    }

    #[tokio::test]
    async fn daily_summary_counts_distinct_types() {
        let warehouse = InMemoryWarehouse::new();
        let now = Utc::now();
        warehouse
            .insert_error_event(error_row("acme:ai:chat", ErrorCategory::Timeout, now))
            .await
            .unwrap();
        warehouse
            .insert_error_event(error_row("acme:ai:chat", ErrorCategory::Network, now))
            .await
            .unwrap();

        let summary = daily_summary(&warehouse, now, 10).await.unwrap();
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.distinct_types, 2);
    }
}
