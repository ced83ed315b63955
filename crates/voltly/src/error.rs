//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing diagnostics with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes the CLI commits to.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("No station configured")]
    #[diagnostic(
        code(voltly::no_station),
        help(
            "Add a station with: voltly config init --uid <POI_UID>\n\
             Or pass --uid directly.\n\
             Find a uid with: voltly find --link <share-link>\n\
             Config file: {path}"
        )
    )]
    NoStation { path: String },

    #[error("Station profile '{name}' not found")]
    #[diagnostic(
        code(voltly::unknown_profile),
        help("Check the [stations.{name}] section in {path}")
    )]
    UnknownProfile { name: String, path: String },

    #[error("No map API key configured")]
    #[diagnostic(
        code(voltly::no_api_key),
        help(
            "Set VOLTLY_API_KEY, or api_key in the config file.\n\
             The key is only needed for --query searches; --link works without one."
        )
    )]
    NoApiKey,

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(voltly::validation))]
    Validation { field: String, reason: String },

    // ── Wrapped layers ───────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(voltly::config))]
    Config(#[from] voltly_config::ConfigError),

    #[error(transparent)]
    #[diagnostic(code(voltly::core))]
    Core(#[from] voltly_core::CoreError),

    #[error(transparent)]
    #[diagnostic(code(voltly::api))]
    Api(#[from] voltly_api::Error),

    // ── Operation ────────────────────────────────────────────────────

    #[error("{0}")]
    #[diagnostic(code(voltly::operation))]
    Operation(String),
}

impl CliError {
    /// Map the error to its exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoStation { .. }
            | Self::UnknownProfile { .. }
            | Self::NoApiKey
            | Self::Config(_) => exit_code::CONFIG,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Api(err) if err.is_transient() => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}
