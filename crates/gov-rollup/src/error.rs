// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the Rollup Engine and Anomaly Detector.

/// Errors raised while rolling up hourly snapshots or detecting anomalies.
#[derive(thiserror::Error, Debug)]
pub enum RollupError {
    /// The warehouse backend failed.
    #[error("warehouse error: {0}")]
    Warehouse(#[from] gov_warehouse::WarehouseError),
}
