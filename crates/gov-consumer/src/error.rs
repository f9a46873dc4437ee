// SPDX-License-Identifier: Apache-2.0

//! Errors raised by this crate's own (non-enforcement-path) operations.
//!
//! Per-message enforcement failures (budget, cost, alerting, throttle) are
//! caught and logged at the call site rather than surfaced here — see
//! [`crate::consumer::TelemetryConsumer::process_batch`].

use miette::Diagnostic;

/// Errors surfaced by the heartbeat path, the only place in this crate
/// that propagates rather than catches.
#[derive(thiserror::Error, Diagnostic, Debug)]
pub enum ConsumerError {
    /// The warehouse backend failed.
    #[error("warehouse error: {0}")]
    Warehouse(#[from] gov_warehouse::WarehouseError),
}
