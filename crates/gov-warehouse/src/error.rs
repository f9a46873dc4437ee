// SPDX-License-Identifier: Apache-2.0

//! Errors raised by a [`crate::RelationalWarehouse`] implementation.

/// Errors a relational warehouse backend may raise. Enforcement-path callers
/// (budget trip events, error events) are required to catch and log rather
/// than propagate.
#[derive(thiserror::Error, Debug)]
pub enum WarehouseError {
    /// The backend connection, transport, or statement execution failed.
    #[error("warehouse statement failed: {0}")]
    Statement(String),

    /// A batched write partially failed; the batch should be
    /// retried as individual inserts.
    #[error("batched write of {attempted} rows failed after {succeeded} succeeded: {reason}")]
    BatchFailed {
        /// Number of rows the caller attempted to write in the batch.
        attempted: usize,
        /// Number of rows that were committed before the failure.
        succeeded: usize,
        /// Underlying failure reason.
        reason: String,
    },

    /// The requested row does not exist.
    #[error("row not found: {0}")]
    NotFound(String),
}
