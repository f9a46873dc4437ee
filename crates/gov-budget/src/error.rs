// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the circuit breaker and Budget Enforcer.
//!
//! Every caller on the telemetry enforcement path is required
//! to catch these and log rather than propagate — the type exists so that
//! callers have something concrete to catch, not to be bubbled to the top.

/// Errors raised while evaluating or mutating circuit-breaker state.
#[derive(thiserror::Error, Debug)]
pub enum BudgetError {
    /// The KVCS backend failed.
    #[error("kvcs error: {0}")]
    Kvcs(#[from] gov_kvcs::KvcsError),

    /// The warehouse backend failed.
    #[error("warehouse error: {0}")]
    Warehouse(#[from] gov_warehouse::WarehouseError),

    /// A feature key string failed to parse.
    #[error("invalid feature key: {0}")]
    FeatureKey(#[from] gov_core::CoreError),
}
