// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the throttle controller.

/// Errors raised while reading or writing PID/reservoir state.
#[derive(thiserror::Error, Debug)]
pub enum ThrottleError {
    /// The KVCS backend failed.
    #[error("kvcs error: {0}")]
    Kvcs(#[from] gov_kvcs::KvcsError),

    /// The reservoir helper failed.
    #[error("sampling error: {0}")]
    Sampling(#[from] gov_sampling::SamplingError),
}
