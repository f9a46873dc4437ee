// SPDX-License-Identifier: Apache-2.0

//! Key-Value Control Store (KVCS) abstraction.
//!
//! The platform's hot-path circuit-breaker flag, throttle rate,
//! accumulated-cost window, reservoir state, and windowed counters all live
//! behind this trait. Production deployments back it with a real low-latency
//! KV (the concrete backend is an external collaborator);
//! [`memory::InMemoryKvcs`] is the test double used throughout this
//! workspace's unit and integration tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors raised by a KVCS backend.
pub mod error;
/// Literal key-space builders.
pub mod keys;
/// In-memory test-double implementation.
pub mod memory;

pub use error::KvcsError;
pub use memory::InMemoryKvcs;

/// Low-latency key-value store abstraction.
///
/// Every method is a suspension point: implementations must not hold a
/// lock across an `.await`. Values are opaque strings at this layer; typed
/// JSON access is provided by the default [`KeyValueControlStore::get_json`]
/// / [`KeyValueControlStore::put_json`] methods.
#[async_trait]
pub trait KeyValueControlStore: Send + Sync {
    /// Reads the raw string value at `key`, or `None` if absent or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, KvcsError>;

    /// Writes `value` at `key`, with an optional TTL.
    async fn put_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), KvcsError>;

    /// Deletes `key`, if present.
    async fn delete(&self, key: &str) -> Result<(), KvcsError>;

    /// Atomically adds `delta` to the integer stored at `key` (defaulting to
    /// zero if absent), returning the new value. Used for the `CTR:*`
    /// read-modify-write counters; the short race window across
    /// concurrent consumer instances is design-accepted.
    async fn incr_by(
        &self,
        key: &str,
        delta: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, KvcsError>;
}

/// Typed JSON convenience methods layered on [`KeyValueControlStore`].
///
/// Split into its own trait (rather than default methods on
/// [`KeyValueControlStore`] itself) so the base trait stays object-safe:
/// callers thread an `Arc<dyn KeyValueControlStore>` through the consumer,
/// budget enforcer, and throttle controller, and this extension trait is
/// blanket-implemented for any such `?Sized` target.
#[async_trait]
pub trait KvcsJsonExt: KeyValueControlStore {
    /// Reads and JSON-deserializes the value at `key`.
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KvcsError> {
        match self.get_raw(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|source| KvcsError::Deserialize {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// JSON-serializes `value` and writes it at `key` with an optional TTL.
    async fn put_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), KvcsError> {
        let raw = serde_json::to_string(value).map_err(|source| KvcsError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.put_raw(key, raw, ttl).await
    }
}

impl<T: KeyValueControlStore + ?Sized> KvcsJsonExt for T {}
