// ── Resource keys ──
//
// A key is the canonical identity of one logical request: the JSON
// serialization of either the explicit `key` option or the string
// `"<METHOD> <url>"`. Configurations that serialize identically share a
// key, and therefore a cache entry.

use std::fmt;
use std::num::FpCategory;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RequestConfig;

/// Canonical, serialized identity of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Build a key from an arbitrary JSON value.
    pub fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    /// The serialized key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key as the JSON value it was serialized from.
    pub fn to_value(&self) -> Value {
        serde_json::from_str(&self.0).unwrap_or_else(|_| Value::String(self.0.clone()))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_value() {
            Value::String(s) => f.write_str(&s),
            _ => f.write_str(&self.0),
        }
    }
}

/// Derive the key for `url` under `config`.
///
/// An explicit, non-empty `key` option wins; otherwise the key is
/// `"<METHOD> <url>"` with the method defaulting to `GET`.
pub fn resolve_key(url: &str, config: &RequestConfig) -> ResourceKey {
    match &config.key {
        Some(key) if !is_blank(key) => ResourceKey::from_value(key),
        _ => ResourceKey::from_value(&Value::String(format!(
            "{} {url}",
            config.method_or_default()
        ))),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f.classify() == FpCategory::Zero),
        _ => false,
    }
}
