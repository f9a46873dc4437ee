// SPDX-License-Identifier: Apache-2.0

//! Errors raised while persisting reservoir state.

/// Errors raised by the KVCS-backed reservoir helper.
#[derive(thiserror::Error, Debug)]
pub enum SamplingError {
    /// The KVCS backend failed.
    #[error("kvcs error: {0}")]
    Kvcs(#[from] gov_kvcs::KvcsError),
}
