// SPDX-License-Identifier: Apache-2.0

//! Fingerprint-window dedup for alert delivery.
//!
//! Delivery is best-effort, so this is a plain read-then-write rather than a
//! compare-and-swap: a race between two instances both deciding to deliver
//! the same fingerprint in the same instant yields at most one duplicate
//! alert, which is the same amplification already tolerated for
//! `CTR:*` counters.

use std::time::Duration;

use gov_kvcs::{keys, KeyValueControlStore};

use crate::error::AlertingError;

/// How long a fingerprint suppresses repeat P0 delivery.
pub const DEDUP_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Returns `true` and marks `fingerprint` as seen if it was *not* already
/// seen within [`DEDUP_WINDOW`]. Returns `false` without marking it if a
/// delivery for this fingerprint already happened inside the window.
pub async fn should_deliver(
    kvcs: &dyn KeyValueControlStore,
    fingerprint: &str,
) -> Result<bool, AlertingError> {
    let key = keys::alert_dedup(fingerprint);
    if kvcs.get_raw(&key).await?.is_some() {
        return Ok(false);
    }
    kvcs.put_raw(&key, "1".to_string(), Some(DEDUP_WINDOW)).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_kvcs::InMemoryKvcs;

    #[tokio::test]
    async fn first_occurrence_delivers_second_is_suppressed() {
        let kvcs = InMemoryKvcs::new();
        assert!(should_deliver(&kvcs, "fp-a").await.unwrap());
        assert!(!should_deliver(&kvcs, "fp-a").await.unwrap());
    }

    #[tokio::test]
    async fn distinct_fingerprints_both_deliver() {
        let kvcs = InMemoryKvcs::new();
        assert!(should_deliver(&kvcs, "fp-a").await.unwrap());
        assert!(should_deliver(&kvcs, "fp-b").await.unwrap());
    }
}
