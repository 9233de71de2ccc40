// ── Core error types ──
//
// Fetch failures never surface here -- the coordinator records them in
// request state. These errors cover setup and caller-side misuse:
// building the engine, serializing configurations, decoding payloads.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unknown resource key: {key}")]
    UnknownKey { key: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Transport errors (wrapped, not exposed raw) ──────────────────
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Request cancelled")]
    Cancelled,
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<refetch_api::Error> for CoreError {
    fn from(err: refetch_api::Error) -> Self {
        match err {
            refetch_api::Error::Client(message) => CoreError::Config { message },
            refetch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            refetch_api::Error::Cancelled => CoreError::Cancelled,
            other => CoreError::Transport {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}
