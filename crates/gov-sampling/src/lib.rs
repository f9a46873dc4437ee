// SPDX-License-Identifier: Apache-2.0

//! Reservoir Sampler and Adaptive Error Sampler.

/// Errors raised by the KVCS-backed reservoir helper.
pub mod error;
/// Per-batch adaptive error-persistence sampling.
pub mod error_sampler;
/// The Algorithm-R reservoir algorithm itself.
pub mod reservoir;
/// KVCS persistence for reservoir state.
pub mod reservoir_store;

pub use error::SamplingError;
pub use error_sampler::BatchErrorSamplerState;
pub use reservoir::{ReservoirState, DEFAULT_CAPACITY};
