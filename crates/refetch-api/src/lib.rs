//! Transport layer for `refetch`.
//!
//! - **[`Fetcher`]**: the pluggable request/response contract the core
//!   coordinator calls into, with cooperative cancellation.
//! - **[`HttpFetcher`]**: the default `reqwest`-backed implementation.
//! - **URL templates** ([`set_url_params`], [`append_query`], [`compose_url`]):
//!   path parameter substitution and query merging.

pub mod error;
pub mod fetcher;
pub mod http;
pub mod transport;
pub mod url_template;

pub use error::Error;
pub use fetcher::{FetchRequest, FetchResponse, Fetcher, RequestBody, ResponseBody};
pub use http::HttpFetcher;
pub use transport::TransportConfig;
pub use url_template::{append_query, compose_url, set_url_params, value_to_url_string};

// Re-exported so fetcher implementors don't need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
