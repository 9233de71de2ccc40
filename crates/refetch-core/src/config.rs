// ── Request and engine configuration ──
//
// `RequestConfig` describes one logical request: how to fetch it and how
// to keep it fresh. Its serialized JSON form is the request's value
// identity (the "fingerprint"); two configs that serialize identically are
// the same configuration. `RevalidatorConfig` holds process-level settings.
// Neither type touches disk -- the config crate builds them.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use refetch_api::{Fetcher, TransportConfig};

use crate::error::CoreError;
use crate::timespan::TimeSpan;

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_ATTEMPT_INTERVAL: &str = "2 sec";

/// Options for a single logical request.
///
/// Unset options fall back to the engine's [`RequestDefaults`] when the
/// request is opened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestConfig {
    /// Explicit cache key; overrides the `"<METHOD> <url>"` derivation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Query parameters appended to the locator.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub query: IndexMap<String, Value>,
    /// Path parameters substituted into `[name]` / `:name` segments.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, Value>,
    /// Initial payload before the first response arrives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub suspense: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revalidate_interval: Option<TimeSpan>,
    /// Custom transport; not part of the configuration's identity.
    #[serde(skip)]
    pub fetcher: Option<Arc<dyn Fetcher>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revalidate_on_focus: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revalidate_on_reconnect: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_interval: Option<TimeSpan>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub fn with_key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_default(mut self, data: impl Into<Value>) -> Self {
        self.default = Some(data.into());
        self
    }

    pub fn with_suspense(mut self, suspense: bool) -> Self {
        self.suspense = suspense;
        self
    }

    pub fn with_auto(mut self, auto: bool) -> Self {
        self.auto = Some(auto);
        self
    }

    pub fn with_revalidate_interval(mut self, span: impl Into<TimeSpan>) -> Self {
        self.revalidate_interval = Some(span.into());
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_revalidate_on_focus(mut self, enabled: bool) -> Self {
        self.revalidate_on_focus = Some(enabled);
        self
    }

    pub fn with_revalidate_on_reconnect(mut self, enabled: bool) -> Self {
        self.revalidate_on_reconnect = Some(enabled);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_attempt_interval(mut self, span: impl Into<TimeSpan>) -> Self {
        self.attempt_interval = Some(span.into());
        self
    }

    // ── Resolved options ─────────────────────────────────────────────

    pub fn method_or_default(&self) -> String {
        self.method
            .as_deref()
            .unwrap_or(DEFAULT_METHOD)
            .to_ascii_uppercase()
    }

    pub fn is_auto(&self) -> bool {
        self.auto.unwrap_or(true)
    }

    pub fn attempt_limit(&self) -> u32 {
        self.attempts.unwrap_or(DEFAULT_ATTEMPTS)
    }

    /// Fixed revalidation period, if one is configured and positive.
    pub fn interval(&self) -> Option<Duration> {
        self.revalidate_interval
            .as_ref()
            .and_then(TimeSpan::as_duration)
    }

    /// Backoff before an error retry, if positive.
    pub fn retry_delay(&self) -> Option<Duration> {
        match &self.attempt_interval {
            Some(span) => span.as_duration(),
            None => TimeSpan::from(DEFAULT_ATTEMPT_INTERVAL).as_duration(),
        }
    }

    pub fn on_focus(&self) -> bool {
        self.revalidate_on_focus.unwrap_or(false)
    }

    pub fn on_reconnect(&self) -> bool {
        self.revalidate_on_reconnect.unwrap_or(false)
    }

    /// Fill every unset option from `defaults`.
    pub fn with_defaults(mut self, defaults: &RequestDefaults) -> Self {
        self.auto.get_or_insert(defaults.auto);
        self.attempts.get_or_insert(defaults.attempts);
        self.attempt_interval
            .get_or_insert_with(|| defaults.attempt_interval.clone());
        if self.revalidate_interval.is_none() {
            self.revalidate_interval.clone_from(&defaults.revalidate_interval);
        }
        self.revalidate_on_focus
            .get_or_insert(defaults.revalidate_on_focus);
        self.revalidate_on_reconnect
            .get_or_insert(defaults.revalidate_on_reconnect);
        self
    }

    /// The configuration's value identity: its serialized JSON.
    pub fn fingerprint(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Engine-wide fallbacks for unset per-request options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub auto: bool,
    pub attempts: u32,
    pub attempt_interval: TimeSpan,
    pub revalidate_interval: Option<TimeSpan>,
    pub revalidate_on_focus: bool,
    pub revalidate_on_reconnect: bool,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            auto: true,
            attempts: DEFAULT_ATTEMPTS,
            attempt_interval: TimeSpan::from(DEFAULT_ATTEMPT_INTERVAL),
            revalidate_interval: None,
            revalidate_on_focus: false,
            revalidate_on_reconnect: false,
        }
    }
}

/// Configuration for a [`Revalidator`](crate::Revalidator).
///
/// Built by the CLI or the config crate -- core never reads config files.
#[derive(Debug, Clone, Default)]
pub struct RevalidatorConfig {
    /// Settings for the default HTTP fetcher.
    pub transport: TransportConfig,
    /// Fallbacks applied to every opened request.
    pub defaults: RequestDefaults,
}
