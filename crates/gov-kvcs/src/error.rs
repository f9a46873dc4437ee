// SPDX-License-Identifier: Apache-2.0

//! Errors raised by a [`crate::KeyValueControlStore`] implementation.

/// Errors a KVCS backend may raise. Callers on the enforcement path are required to catch these and log rather than propagate.
#[derive(thiserror::Error, Debug)]
pub enum KvcsError {
    /// The backend connection or transport failed.
    #[error("kvcs backend unavailable: {0}")]
    Unavailable(String),

    /// A stored value failed to deserialize as the type the caller requested.
    #[error("kvcs value at '{key}' failed to deserialize: {source}")]
    Deserialize {
        /// The key whose value failed to deserialize.
        key: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A value failed to serialize before being written.
    #[error("kvcs value for '{key}' failed to serialize: {source}")]
    Serialize {
        /// The key whose value failed to serialize.
        key: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
