// SPDX-License-Identifier: Apache-2.0

//! Process-wide tracing/log setup.
//!
//! One process-wide `tracing_subscriber` is installed by [`init`], mirroring
//! the dataflow engine's single-subscriber-per-process convention. The
//! `GOV_LOG` environment variable controls the filter (default `info`).

use tracing_subscriber::EnvFilter;

/// The environment variable consulted for the log filter.
pub const LOG_FILTER_ENV: &str = "GOV_LOG";

/// Installs the process-wide `tracing` subscriber.
///
/// Idempotent-ish: if a global subscriber is already set (e.g. in a test
/// harness that installs its own), this logs nothing and returns without
/// panicking.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed; skipping");
    }
}

/// Formats a stable error fingerprint component list into one string.
///
/// Used by the alerter and the consumer's per-message failure logging to
/// build the `category:code:errname:stack-head` fingerprint seed.
#[must_use]
pub fn join_fingerprint_parts(parts: &[&str]) -> String {
    parts.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_fingerprint_parts() {
        assert_eq!(
            join_fingerprint_parts(&["VALIDATION", "400", "BadRequest", "handler.rs:12"]),
            "VALIDATION:400:BadRequest:handler.rs:12"
        );
    }
}
