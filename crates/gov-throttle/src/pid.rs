// SPDX-License-Identifier: Apache-2.0

//! PID loop math and [`PIDState`].
//!
//! Pure, synchronous, and KVCS-free, so the control law can be unit tested
//! independently of persistence and of the "not more than once per
//! `UPDATE_INTERVAL_MS`" gating in [`crate::controller`].

use serde::{Deserialize, Serialize};

/// Proportional gain.
pub const KP: f64 = 0.6;
/// Integral gain.
pub const KI: f64 = 0.2;
/// Derivative gain.
pub const KD: f64 = 0.05;
/// Target utilization.
pub const SETPOINT: f64 = 1.0;
/// Anti-windup lower clamp for the integral term.
pub const INTEGRAL_MIN: f64 = -10.0;
/// Anti-windup upper clamp for the integral term.
pub const INTEGRAL_MAX: f64 = 10.0;
/// Minimum milliseconds between PID updates for a given feature.
pub const UPDATE_INTERVAL_MS: i64 = 60_000;

/// Per-feature PID controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PIDState {
    /// Accumulated (clamped) integral of the error term.
    pub integral_error: f64,
    /// The error observed on the previous update.
    pub last_error: f64,
    /// Epoch milliseconds of the previous update.
    pub last_update_ms: i64,
    /// Current throttle rate, in `[0, 1]`.
    pub throttle_rate: f64,
}

impl PIDState {
    /// Runs one PID step given a new `utilisation` reading at `now_ms`.
    ///
    /// `utilisation` is clamped to `[0, 2]` before use. Returns the
    /// new state; the caller decides whether to persist `throttle_rate`
    /// verbatim (active mode) or force it to zero (shadow mode) before
    /// writing back to KVCS.
    #[must_use]
    pub fn step(self, utilisation: f64, now_ms: i64) -> PIDState {
        let utilisation = utilisation.clamp(0.0, 2.0);
        let dt_ms = (now_ms - self.last_update_ms).max(1);
        let dt = dt_ms as f64 / 1000.0;

        let error = SETPOINT - utilisation;
        let integral = (self.integral_error + error * dt).clamp(INTEGRAL_MIN, INTEGRAL_MAX);
        let derivative = (error - self.last_error) / dt;
        let raw = -(KP * error + KI * integral + KD * derivative);
        let throttle_rate = raw.clamp(0.0, 1.0);

        PIDState {
            integral_error: integral,
            last_error: error,
            last_update_ms: now_ms,
            throttle_rate,
        }
    }

    /// True if at least [`UPDATE_INTERVAL_MS`] has elapsed since the last
    /// update.
    #[must_use]
    pub fn due(&self, now_ms: i64) -> bool {
        now_ms - self.last_update_ms >= UPDATE_INTERVAL_MS
    }
}
