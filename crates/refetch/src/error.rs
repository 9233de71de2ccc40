//! CLI error types with miette diagnostics.
//!
//! Maps engine and configuration errors into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use refetch_config::ConfigError;
use refetch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const REQUEST: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Requests ─────────────────────────────────────────────────────
    #[error(
        "Request {key} failed{}",
        .status.map_or_else(String::new, |s| format!(" with status {s}"))
    )]
    #[diagnostic(
        code(refetch::request_failed),
        help("The final state was printed above. Re-run with -v for transport logs.")
    )]
    RequestFailed { key: String, status: Option<u16> },

    #[error("Transport error: {message}")]
    #[diagnostic(
        code(refetch::transport),
        help("Check that the server is reachable, or raise --timeout.")
    )]
    Transport { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(refetch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(refetch::config),
        help("Run: refetch config path  to locate the configuration file")
    )]
    Config(#[from] ConfigError),

    #[error("Engine error: {message}")]
    #[diagnostic(code(refetch::engine))]
    Engine { message: String },

    // ── Serialization ────────────────────────────────────────────────
    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(refetch::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(refetch::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RequestFailed { .. } => exit_code::REQUEST,
            Self::Transport { .. } => exit_code::CONNECTION,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "request".into(),
                reason: message,
            },
            CoreError::Serialization(e) => CliError::Json(e),
            CoreError::Transport { message, .. } => CliError::Transport { message },
            other @ (CoreError::UnknownKey { .. } | CoreError::Cancelled) => CliError::Engine {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failure_mentions_status() {
        let err = CliError::RequestFailed {
            key: "GET /users".into(),
            status: Some(404),
        };
        assert_eq!(err.to_string(), "Request GET /users failed with status 404");
        assert_eq!(err.exit_code(), exit_code::REQUEST);

        let err = CliError::RequestFailed {
            key: "GET /users".into(),
            status: None,
        };
        assert_eq!(err.to_string(), "Request GET /users failed");
    }

    #[test]
    fn engine_config_errors_are_usage_errors() {
        let err = CliError::from(CoreError::Config {
            message: "bad header".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
