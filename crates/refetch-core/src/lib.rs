//! Key-indexed request cache and revalidation engine.
//!
//! This crate owns the request state machine that sits between
//! `refetch-api` (transport) and consumers (the CLI, or any UI shell):
//!
//! - **[`Revalidator`]**: Engine context owning every per-key container
//!   and its bookkeeping. [`open()`](Revalidator::open) resolves a
//!   locator + [`RequestConfig`] to a [`ResourceKey`], creates or reuses
//!   that key's container, and starts its initial cycle.
//!
//! - **[`Resource`]**: One caller's handle on a key: snapshot access,
//!   [`subscribe()`](Resource::subscribe), forced
//!   [`revalidate()`](Resource::revalidate), optimistic
//!   [`mutate()`](Resource::mutate), and the config-change trigger via
//!   [`reconfigure()`](Resource::reconfigure).
//!
//! - **[`Watcher`]**: Scoped lifetime of a resource's interval, error-retry
//!   and focus/reconnect triggers. Dropping it clears every timer.
//!
//! - **[`RequestState`]**: Observable outcome of the latest cycle
//!   (`data`, `loading`, `revalidating`, `error`, `success`, `status`,
//!   timing), streamed through [`StateStream`].
//!
//! Concurrent cycles for one key supersede each other: each new cycle
//! cancels the one in flight, and only the latest may commit state.

pub mod config;
pub mod error;
pub mod key;
pub mod state;
pub mod stream;
pub mod timespan;
pub mod trigger;

mod coordinator;
mod revalidator;
mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{RequestConfig, RequestDefaults, RevalidatorConfig};
pub use error::CoreError;
pub use key::{ResourceKey, resolve_key};
pub use revalidator::{Resource, Revalidator};
pub use state::RequestState;
pub use stream::{StateStream, StateWatchStream};
pub use timespan::{TimeSpan, normalize};
pub use trigger::{EnvEvent, EnvSignals, Watcher};

// Transport types callers need to plug in a fetcher.
pub use refetch_api::{
    CancellationToken, FetchRequest, FetchResponse, Fetcher, RequestBody, ResponseBody,
    TransportConfig,
};
