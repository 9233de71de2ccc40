// ── Observable request state ──
//
// One `RequestState` per key. Transitions are applied by the coordinator
// through the methods below so the flag invariants hold everywhere:
// `error` and `success` are never both set, and `revalidating` implies
// `loading`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoreError;
use crate::key::ResourceKey;

/// Derived state of the most recent fetch cycle for one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestState {
    /// Last known payload (the configured default until a response arrives).
    pub data: Option<Value>,
    pub loading: bool,
    /// A refresh of already-present data is in flight.
    pub revalidating: bool,
    pub error: bool,
    pub success: bool,
    /// Last HTTP status observed.
    pub status: Option<u16>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Milliseconds taken by the most recent cycle.
    pub response_time: Option<u64>,
    pub key: ResourceKey,
}

impl RequestState {
    pub(crate) fn initial(key: ResourceKey, data: Option<Value>, auto: bool) -> Self {
        Self {
            data,
            loading: auto,
            revalidating: false,
            error: false,
            success: false,
            status: None,
            start: Some(Utc::now()),
            end: None,
            response_time: None,
            key,
        }
    }

    /// Loading with no data to show yet (not a background refresh).
    pub fn is_loading_fresh(&self) -> bool {
        self.loading && !self.revalidating
    }

    /// Deserialize the payload into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, CoreError> {
        self.data
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(CoreError::from)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Enter the loading phase, seeding `data` from the per-config cache.
    pub(crate) fn begin(&mut self, refresh: bool, cached: Option<Value>, now: DateTime<Utc>) {
        if let Some(data) = cached {
            self.data = Some(data);
        }
        self.loading = true;
        self.revalidating = refresh && self.data.is_some();
        self.error = false;
        self.start = Some(now);
    }

    pub(crate) fn succeed(
        &mut self,
        data: Value,
        status: u16,
        end: DateTime<Utc>,
        response_time: Option<u64>,
    ) {
        self.data = Some(data);
        self.status = Some(status);
        self.end = Some(end);
        self.response_time = response_time;
        self.loading = false;
        self.revalidating = false;
        self.error = false;
        self.success = true;
    }

    /// Record a failed cycle. `data` of `None` keeps the previous payload.
    pub(crate) fn fail(
        &mut self,
        data: Option<Value>,
        status: Option<u16>,
        end: DateTime<Utc>,
        response_time: Option<u64>,
    ) {
        if let Some(data) = data {
            self.data = Some(data);
        }
        self.status = status;
        self.end = Some(end);
        self.response_time = response_time;
        self.loading = false;
        self.revalidating = false;
        self.error = true;
        self.success = false;
    }

    /// Leave the loading phase without an outcome. Returns `false` if the
    /// state was not loading.
    pub(crate) fn abandon(&mut self) -> bool {
        if !self.loading {
            return false;
        }
        self.loading = false;
        self.revalidating = false;
        true
    }

    pub(crate) fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }
}
