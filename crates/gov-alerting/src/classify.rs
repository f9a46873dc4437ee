// SPDX-License-Identifier: Apache-2.0

//! Error classification.
//!
//! The consumer hands the alerter whatever shape the originating failure
//! took (a caught exception, an HTTP response, a driver error) flattened
//! into a [`RawError`]; this module maps it onto the fixed eleven-category
//! taxonomy using a fixed rule set, the same way the consumer's own body
//! errors get classified before retry.

use gov_core::ErrorCategory;

/// A caught failure, flattened enough to classify and fingerprint.
#[derive(Debug, Clone, Default)]
pub struct RawError {
    /// Exception/error type name, e.g. `"ValidationError"`, `"TimeoutError"`.
    pub type_name: String,
    /// The error message text.
    pub message: String,
    /// Explicit application error code, if the error shape carried one.
    pub code: Option<String>,
    /// POSIX errno, if the error shape carried one.
    pub errno: Option<i32>,
    /// HTTP status code, if the failure came from an HTTP response.
    pub http_status: Option<u16>,
    /// Captured stack trace, top frame first.
    pub stack: Vec<String>,
}

impl RawError {
    /// The first stack frame, used by [`crate::fingerprint`].
    #[must_use]
    pub fn first_stack_line(&self) -> Option<&str> {
        self.stack.first().map(String::as_str)
    }
}

/// Extracts an error code from the `{code|errno|HTTP status}` shape
///, preferring an explicit code over errno, and
/// errno over HTTP status.
#[must_use]
pub fn extract_code(err: &RawError) -> Option<String> {
    err.code
        .clone()
        .or_else(|| err.errno.map(|n| n.to_string()))
        .or_else(|| err.http_status.map(|s| s.to_string()))
}

/// Classifies a caught failure into one of the eleven [`ErrorCategory`]
/// values using a fixed rule set over the type name, message, and any HTTP
/// status carried on the error shape.
///
/// Rules are checked in order; the first match wins. `type_name` and
/// `message` are matched case-insensitively against fixed keyword sets, the
/// same granularity the platform's own internal failures are classified at.
#[must_use]
pub fn classify(err: &RawError) -> ErrorCategory {
    let haystack = format!("{} {}", err.type_name, err.message).to_lowercase();

    if let Some(status) = err.http_status {
        if status == 401 || status == 403 {
            return ErrorCategory::Auth;
        }
        if status == 429 {
            return ErrorCategory::RateLimit;
        }
        if status == 408 {
            return ErrorCategory::Timeout;
        }
        if (500..600).contains(&status) {
            return ErrorCategory::ExternalApi;
        }
        if (400..500).contains(&status) {
            return ErrorCategory::Validation;
        }
    }

    if haystack.contains("circuit") && haystack.contains("break") {
        return ErrorCategory::CircuitBreaker;
    }
    if haystack.contains("unauthorized")
        || haystack.contains("forbidden")
        || haystack.contains("auth")
        || haystack.contains("permission denied")
    {
        return ErrorCategory::Auth;
    }
    if haystack.contains("rate limit") || haystack.contains("ratelimit") || haystack.contains("429") {
        return ErrorCategory::RateLimit;
    }
    if haystack.contains("timeout") || haystack.contains("timed out") || haystack.contains("deadline") {
        return ErrorCategory::Timeout;
    }
    if haystack.contains("validation")
        || haystack.contains("invalid")
        || haystack.contains("bad request")
        || haystack.contains("schema")
    {
        return ErrorCategory::Validation;
    }
    if haystack.contains("dns")
        || haystack.contains("connection reset")
        || haystack.contains("econnrefused")
        || haystack.contains("socket")
        || haystack.contains("network")
    {
        return ErrorCategory::Network;
    }
    if haystack.contains("sql")
        || haystack.contains("d1_error")
        || haystack.contains("constraint")
        || haystack.contains("relational")
        || haystack.contains("row not found")
    {
        return ErrorCategory::Relational;
    }
    if haystack.contains("kv ") || haystack.contains("cache") || haystack.contains("kvcs") {
        return ErrorCategory::Cache;
    }
    if haystack.contains("queue") || haystack.contains("deadletter") || haystack.contains("dead letter") {
        return ErrorCategory::Queue;
    }
    if haystack.contains("fetch failed")
        || haystack.contains("upstream")
        || haystack.contains("provider")
        || haystack.contains("external")
    {
        return ErrorCategory::ExternalApi;
    }

    ErrorCategory::Internal
}
