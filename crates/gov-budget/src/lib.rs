// SPDX-License-Identifier: Apache-2.0

//! Budget Enforcer and feature-level circuit-breaker state machine.
//!
//! [`circuit::CircuitBreaker`] owns the `GO`/`STOP` flag shared by the
//! Budget Enforcer ([`enforcer::BudgetEnforcer`]) and the Cost-Budget
//! Enforcer (`gov_cost`); both trip the same KVCS cell and the same
//! `feature_circuit_breaker_events` table.

/// The per-feature `GO`/`STOP` state machine.
pub mod circuit;
/// Errors raised by this crate.
pub mod error;
/// Per-resource rolling-window enforcement.
pub mod enforcer;
/// `BudgetLimits` / `CostBudget` shapes.
pub mod limits;

pub use circuit::{CircuitBreaker, CircuitBreakerStatus, TripDetails};
pub use enforcer::{BudgetEnforcer, ResourceTrip};
pub use error::BudgetError;
pub use limits::{BudgetLimits, ResourceLimit};
