use thiserror::Error;

/// Top-level error type for the `refetch-api` crate.
///
/// Covers every way a single fetch can fail: client construction,
/// transport, payload decoding, and cooperative cancellation.
/// `refetch-core` converts these into request state rather than
/// propagating them to callers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── Fetcher-reported ────────────────────────────────────────────
    /// A custom fetcher rejected the request with a status of its own.
    #[error("Request failed (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The response body was not valid JSON, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization {
        message: String,
        body: String,
        status: Option<u16>,
    },

    // ── Cancellation ────────────────────────────────────────────────
    /// The request was superseded and aborted before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// The HTTP status attached to this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Http { status, .. } => Some(*status),
            Self::Deserialization { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if the request was aborted by its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
