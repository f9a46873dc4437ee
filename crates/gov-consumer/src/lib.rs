// SPDX-License-Identifier: Apache-2.0

//! The Telemetry Consumer and Heartbeat Handler.
//!
//! This crate is the busiest seam in the platform: it owns the per-message
//! pipeline that turns one [`gov_core::TelemetryMessage`] into warehouse
//! facts, budget/cost enforcement, adaptive error sampling, alerting, and
//! the once-per-batch degradation pass (reservoir + PID), wiring together
//! nearly every other crate in the workspace.

/// The Telemetry Consumer: per-message pipeline and per-batch degradation.
pub mod consumer;
/// Errors raised by this crate's own operations.
pub mod error;
/// The Heartbeat Handler: zero-metric health probes.
pub mod heartbeat;

pub use consumer::{BatchSummary, MessageOutcome, TelemetryConsumer};
pub use error::ConsumerError;
