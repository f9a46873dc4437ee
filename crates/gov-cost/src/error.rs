// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the Cost-Budget Enforcer.

/// Errors raised while accumulating or enforcing cost budgets.
#[derive(thiserror::Error, Debug)]
pub enum CostError {
    /// The KVCS backend failed.
    #[error("kvcs error: {0}")]
    Kvcs(#[from] gov_kvcs::KvcsError),

    /// The underlying circuit breaker failed to trip.
    #[error("budget error: {0}")]
    Budget(#[from] gov_budget::BudgetError),
}
