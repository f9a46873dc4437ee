// SPDX-License-Identifier: Apache-2.0

//! KVCS-backed daily-aggregate cache for the dashboard query endpoint.
//!
//! Cells are keyed `(date, project)` via [`gov_kvcs::keys::query_cache`] and
//! invalidated by the Rollup Engine after each daily rollup, so a cache hit here is always safe to serve as-is.

use std::time::Duration;

use gov_kvcs::{keys, KeyValueControlStore, KvcsJsonExt};
use gov_warehouse::model::DailyRollup;

use crate::error::QueryError;

/// TTL for a cached daily rollup cell, matching the settings cache's
/// `CONFIG:SETTINGS:*` 1h TTL order of magnitude rather than the
/// daily-rollup row's own lifetime, since explicit invalidation (not
/// expiry) is the primary eviction path.
const QUERY_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Reads the cached daily rollup for `(date, project)`, if present.
pub async fn get(kvcs: &dyn KeyValueControlStore, date: &str, project: &str) -> Result<Option<DailyRollup>, QueryError> {
    Ok(kvcs.get_json(&keys::query_cache(date, project)).await?)
}

/// Populates the cache cell for `(date, project)` with `row`.
pub async fn put(kvcs: &dyn KeyValueControlStore, date: &str, project: &str, row: &DailyRollup) -> Result<(), QueryError> {
    kvcs.put_json(&keys::query_cache(date, project), row, Some(QUERY_CACHE_TTL))
        .await?;
    Ok(())
}
