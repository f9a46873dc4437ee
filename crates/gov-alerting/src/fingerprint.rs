// SPDX-License-Identifier: Apache-2.0

//! Error fingerprinting for dedup.

use gov_core::ErrorCategory;

use crate::classify::RawError;

/// Computes `sha(category | code | name | first-stack-line)`, used to
/// deduplicate repeated occurrences of the same failure across a window.
///
/// `blake3` is used in place of a generic `sha`: it is
/// the wider pack reach for it as the default fast content hash, and nothing
/// here needs cryptographic collision resistance across untrusted input.
#[must_use]
pub fn fingerprint(category: ErrorCategory, code: Option<&str>, err: &RawError) -> String {
    fingerprint_parts(category, code, &err.type_name, err.first_stack_line())
}

/// The same hash [`fingerprint`] computes, taken directly from its parts
/// rather than a [`RawError`] — used when the originating producer already
/// classified the error (no caught exception to pull a type name/stack
/// from), e.g. a [`gov_core::TelemetryMessage`]'s own `error_category`.
#[must_use]
pub fn fingerprint_parts(
    category: ErrorCategory,
    code: Option<&str>,
    name: &str,
    first_stack_line: Option<&str>,
) -> String {
    let parts = [category_str(category), code.unwrap_or(""), name, first_stack_line.unwrap_or("")];
    let joined = parts.join("|");
    blake3::hash(joined.as_bytes()).to_hex().to_string()
}

fn category_str(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Validation => "VALIDATION",
        ErrorCategory::Network => "NETWORK",
        ErrorCategory::CircuitBreaker => "CIRCUIT_BREAKER",
        ErrorCategory::Internal => "INTERNAL",
        ErrorCategory::Auth => "AUTH",
        ErrorCategory::RateLimit => "RATE_LIMIT",
        ErrorCategory::Relational => "RELATIONAL",
        ErrorCategory::Cache => "CACHE",
        ErrorCategory::Queue => "QUEUE",
        ErrorCategory::ExternalApi => "EXTERNAL_API",
        ErrorCategory::Timeout => "TIMEOUT",
    }
}
