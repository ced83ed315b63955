// ── Core error types ──
//
// Consumers never see raw HTTP or JSON parse failures from the polling
// path -- transport faults degrade to empty results inside the
// coordinator. What remains here are configuration problems and the one
// hard fault the converter layer can raise.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Reverse enum lookup failed: the mapping table has no entry whose
    /// mapped value equals the one being encoded. Only reachable through
    /// the write-direction path, which the polling flow never uses, so
    /// this indicates a programming or configuration error.
    #[error("No matching key for value {value} in enum table of '{attr}'")]
    NoMatchingKey { attr: String, value: String },

    /// Configuration problem (bad base URL, empty station uid).
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error from the charge service client, for callers that go through
    /// the api crate directly (discovery flows).
    #[error("API error: {0}")]
    Api(#[from] voltly_api::Error),
}
