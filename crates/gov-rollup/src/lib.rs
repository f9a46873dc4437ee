// SPDX-License-Identifier: Apache-2.0

//! The Rollup Engine and Anomaly Detector.

/// Anomaly detection over rolling daily-rollup windows.
pub mod anomaly;
/// Errors raised by this crate.
pub mod error;
/// Daily/monthly aggregation and gap-fill reconstruction.
pub mod rollup;

pub use anomaly::detect_daily_anomaly;
pub use error::RollupError;
pub use rollup::{reconstruct_daily, rollup_daily, rollup_monthly};
