// SPDX-License-Identifier: Apache-2.0

//! Cost Calculator and Cost-Budget Enforcer.
//!
//! [`calculator`] maps a [`gov_core::MetricBundle`] onto USD; [`enforcer`]
//! accumulates that cost into a rolling 24h per-feature window and trips
//! the shared [`gov_budget::CircuitBreaker`] on exceed.

/// Maps a metric bundle to USD via the pricing table.
pub mod calculator;
/// Rolling-window cost-budget accumulation and enforcement.
pub mod enforcer;
/// Errors raised by this crate.
pub mod error;

pub use calculator::{calculate_cf_cost, combine};
pub use enforcer::{round6, AccumulatedCost, CostBudget, CostBudgetEnforcer};
pub use error::CostError;
