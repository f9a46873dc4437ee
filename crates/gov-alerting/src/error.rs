// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the alerting crate.

/// Errors raised while classifying, recording, or escalating errors.
///
/// Per the enforcement-path contract, callers log and discard these rather
/// than propagate them into the consumer's per-message result.
#[derive(thiserror::Error, Debug)]
pub enum AlertingError {
    /// The relational warehouse failed.
    #[error("warehouse error: {0}")]
    Warehouse(#[from] gov_warehouse::WarehouseError),

    /// The key-value control store failed.
    #[error("kvcs error: {0}")]
    Kvcs(#[from] gov_kvcs::KvcsError),
}
