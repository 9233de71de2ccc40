// ── Per-key container ──
//
// Observable request state lives in a `watch` channel; bookkeeping that
// observers must not be notified about lives behind a separate mutex.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::key::ResourceKey;
use crate::state::RequestState;

/// Internal per-key bookkeeping, invisible to state observers.
#[derive(Debug, Default)]
pub(crate) struct KeyTracking {
    /// Fingerprint of the configuration used by the last proceeding cycle.
    pub last_config: Option<String>,
    /// At least one cycle has passed the gate.
    pub initialized: bool,
    /// Cancellation handle of the in-flight cycle.
    pub cancel: Option<CancellationToken>,
    /// Bumped for every started cycle; only the latest may commit.
    pub generation: u64,
    /// Last payload per configuration fingerprint.
    pub cache: HashMap<String, Value>,
    pub started: Option<Instant>,
    /// A network call is outstanding.
    pub running: bool,
    /// Consecutive failed cycles.
    pub failures: u32,
    /// A suspense-mode opener is waiting on the first cycle.
    pub suspended: bool,
}

/// One key's observable state container plus its bookkeeping.
#[derive(Debug)]
pub(crate) struct KeyEntry {
    key: ResourceKey,
    state: watch::Sender<RequestState>,
    tracking: Mutex<KeyTracking>,
}

impl KeyEntry {
    pub(crate) fn new(key: ResourceKey, default: Option<Value>, auto: bool) -> Self {
        let (state, _) = watch::channel(RequestState::initial(key.clone(), default, auto));
        Self {
            key,
            state,
            tracking: Mutex::new(KeyTracking::default()),
        }
    }

    pub(crate) fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Current state (cheap clone of the latest value).
    pub(crate) fn snapshot(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Apply an update and notify observers.
    pub(crate) fn dispatch(&self, update: impl FnOnce(&mut RequestState)) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.state.send_modify(update);
    }

    /// Apply an update that may decline; observers are notified only if it
    /// returns `true`.
    pub(crate) fn dispatch_if(&self, update: impl FnOnce(&mut RequestState) -> bool) -> bool {
        self.state.send_if_modified(update)
    }

    /// Overwrite the payload without touching any other field.
    pub(crate) fn mutate(&self, data: Value) {
        self.dispatch(|state| state.set_data(data));
    }

    pub(crate) fn tracking(&self) -> MutexGuard<'_, KeyTracking> {
        self.tracking.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
