// SPDX-License-Identifier: Apache-2.0

//! In-memory [`KeyValueControlStore`] test double.
//!
//! Backed by a [`dashmap::DashMap`] so it's safe to share behind an `Arc`
//! across concurrent consumer instances, matching the "multiple instances
//! run in parallel" scheduling model.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::KvcsError;
use crate::KeyValueControlStore;

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// An in-memory, TTL-aware KVCS implementation. Not persistent, not
/// distributed; intended for tests and local development only.
#[derive(Default)]
pub struct InMemoryKvcs {
    store: DashMap<String, Entry>,
}

impl InMemoryKvcs {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries. Exposed for test assertions.
    #[must_use]
    pub fn live_len(&self) -> usize {
        let now = Utc::now();
        self.store.iter().filter(|e| e.is_live(now)).count()
    }
}

#[async_trait]
impl KeyValueControlStore for InMemoryKvcs {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, KvcsError> {
        let now = Utc::now();
        Ok(self.store.get(key).and_then(|entry| {
            if entry.is_live(now) {
                Some(entry.value.clone())
            } else {
                None
            }
        }))
    }

    async fn put_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), KvcsError> {
        let expires_at = ttl.and_then(|d| chrono::Duration::from_std(d).ok()).map(|d| Utc::now() + d);
        let _ = self.store.insert(
            key.to_string(),
            Entry {
                value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvcsError> {
        let _ = self.store.remove(key);
        Ok(())
    }

    async fn incr_by(
        &self,
        key: &str,
        delta: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, KvcsError> {
        let now = Utc::now();
        let mut entry = self.store.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });
        if !entry.is_live(now) {
            entry.value = "0".to_string();
            entry.expires_at = None;
        }
        let current: i64 = entry.value.parse().unwrap_or(0);
        let updated = current + delta;
        entry.value = updated.to_string();
        if let Some(d) = ttl.and_then(|d| chrono::Duration::from_std(d).ok()) {
            entry.expires_at = Some(now + d);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KvcsJsonExt;
    use serde::{Deserialize, Serialize};

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let kvcs = InMemoryKvcs::new();
        kvcs.put_raw("k", "v".to_string(), None).await.unwrap();
        assert_eq!(kvcs.get_raw("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let kvcs = InMemoryKvcs::new();
        assert_eq!(kvcs.get_raw("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn incr_by_accumulates() {
        let kvcs = InMemoryKvcs::new();
        assert_eq!(kvcs.incr_by("ctr", 5, None).await.unwrap(), 5);
        assert_eq!(kvcs.incr_by("ctr", 3, None).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn expired_ttl_reads_as_absent() {
        let kvcs = InMemoryKvcs::new();
        kvcs.put_raw("k", "v".to_string(), Some(Duration::from_millis(0)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(kvcs.get_raw("k").await.unwrap(), None);
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        n: u32,
    }

    #[tokio::test]
    async fn json_roundtrip() {
        let kvcs = InMemoryKvcs::new();
        kvcs.put_json("p", &Payload { n: 7 }, None).await.unwrap();
        let got: Option<Payload> = kvcs.get_json("p").await.unwrap();
        assert_eq!(got, Some(Payload { n: 7 }));
    }
}
