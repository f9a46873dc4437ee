// SPDX-License-Identifier: Apache-2.0

//! PID throttle controller and intelligent-degradation orchestration.

pub mod controller;
pub mod degradation;
pub mod error;
pub mod pid;

pub use controller::{update, ThrottleMode};
pub use degradation::{apply, DegradationOutcome, FeatureBatchContribution};
pub use error::ThrottleError;
pub use pid::PIDState;
