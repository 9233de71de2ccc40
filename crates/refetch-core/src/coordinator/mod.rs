// ── Request coordinator ──
//
// The per-key fetch state machine. Every trigger funnels into
// `initiate_cycle`, whose gate alone decides whether a network fetch runs.
// Each proceeding cycle cancels its predecessor and bumps the key's
// generation; only the cycle holding the current generation may write
// terminal state, so a stale response can never overwrite a fresher one.

mod request;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use refetch_api::{Error as ApiError, Fetcher};

use crate::config::RequestConfig;
use crate::error::CoreError;
use crate::key::{ResourceKey, resolve_key};
use crate::state::RequestState;
use crate::store::{KeyEntry, Registry};

use self::request::build_request;

// ── Cycle origin ─────────────────────────────────────────────────────

/// What asked for a cycle. Determines the `revalidation` and `forced`
/// flags of the gate, and whether the cycle yields to one already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Initial load when a resource is opened.
    Mount,
    /// The locator or configuration of a resource changed.
    ConfigChange,
    /// Explicit `revalidate()` by the caller.
    Manual,
    Interval,
    Retry,
    Focus,
    Reconnect,
}

impl Origin {
    fn is_revalidation(self) -> bool {
        !matches!(self, Self::Mount)
    }

    fn is_forced(self) -> bool {
        !matches!(self, Self::Mount | Self::ConfigChange)
    }

    /// Trigger-initiated cycles never overlap a running fetch.
    fn yields_to_running(self) -> bool {
        matches!(
            self,
            Self::Interval | Self::Retry | Self::Focus | Self::Reconnect
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::ConfigChange => "config-change",
            Self::Manual => "manual",
            Self::Interval => "interval",
            Self::Retry => "retry",
            Self::Focus => "focus",
            Self::Reconnect => "reconnect",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Binding ──────────────────────────────────────────────────────────

/// A locator and resolved configuration bound to its key's container.
#[derive(Debug)]
pub(crate) struct Binding {
    pub url: String,
    pub config: Arc<RequestConfig>,
    /// Value identity of `url` + `config`.
    pub fingerprint: String,
    pub entry: Arc<KeyEntry>,
}

impl Binding {
    /// Resolve the key for `url` under `config` and attach its container,
    /// creating it if this is the first reference.
    pub(crate) fn resolve(
        registry: &Registry,
        url: String,
        config: RequestConfig,
    ) -> Result<Self, CoreError> {
        let key = resolve_key(&url, &config);
        let fingerprint = format!("{url} {}", config.fingerprint()?);
        let entry = registry.get_or_create(&key, config.default.clone(), config.is_auto());
        Ok(Self {
            url,
            config: Arc::new(config),
            fingerprint,
            entry,
        })
    }

    pub(crate) fn key(&self) -> &ResourceKey {
        self.entry.key()
    }
}

// ── Coordinator ──────────────────────────────────────────────────────

/// Ticket for a cycle that passed the gate.
struct Cycle {
    generation: u64,
    cancel: CancellationToken,
}

/// Releases the running flag if a cycle ends without committing (for
/// instance when its future is dropped mid-flight).
///
/// The state leaves the loading phase so waiters wake up. An abandoned
/// suspense first load also clears `initialized`, letting the next opener
/// run the first load again.
struct CycleGuard {
    entry: Arc<KeyEntry>,
    generation: u64,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let mut tracking = self.entry.tracking();
        if tracking.generation == self.generation && tracking.running {
            tracking.running = false;
            if std::mem::take(&mut tracking.suspended) {
                tracking.initialized = false;
            }
            if let Some(cancel) = tracking.cancel.take() {
                cancel.cancel();
            }
            debug!(key = %self.entry.key(), generation = self.generation, "cycle abandoned");
            self.entry.dispatch_if(RequestState::abandon);
        }
    }
}

/// Runs fetch cycles against the default fetcher unless a request
/// configuration supplies its own.
#[derive(Debug, Clone)]
pub(crate) struct Coordinator {
    default_fetcher: Arc<dyn Fetcher>,
}

impl Coordinator {
    pub(crate) fn new(default_fetcher: Arc<dyn Fetcher>) -> Self {
        Self { default_fetcher }
    }

    /// Run one fetch cycle for `binding` if the gate allows it.
    ///
    /// Returns the key's state after the cycle, or the unchanged current
    /// state when the gate declined. Fetch failures are recorded in state,
    /// never returned.
    pub(crate) async fn initiate_cycle(&self, binding: &Binding, origin: Origin) -> RequestState {
        let Some(cycle) = Self::begin(binding, origin) else {
            return binding.entry.snapshot();
        };
        let _guard = CycleGuard {
            entry: Arc::clone(&binding.entry),
            generation: cycle.generation,
        };

        let outcome = self.fetch(binding, &cycle.cancel).await;
        Self::commit(binding, &cycle, outcome);
        binding.entry.snapshot()
    }

    /// A network call is outstanding for this key.
    pub(crate) fn is_running(entry: &KeyEntry) -> bool {
        entry.tracking().running
    }

    pub(crate) fn failures(entry: &KeyEntry) -> u32 {
        entry.tracking().failures
    }

    // ── Gate + loading transition ────────────────────────────────────

    fn begin(binding: &Binding, origin: Origin) -> Option<Cycle> {
        let key = binding.key();
        let entry = &binding.entry;
        let mut tracking = entry.tracking();

        let config_changed = tracking.last_config.as_deref() != Some(binding.fingerprint.as_str());
        let proceed = if origin.is_revalidation() {
            origin.is_forced() || config_changed
        } else {
            !tracking.initialized && binding.config.is_auto()
        };
        if !proceed {
            trace!(%key, %origin, "cycle skipped: nothing changed");
            return None;
        }
        if origin.yields_to_running() && tracking.running {
            debug!(%key, %origin, "cycle skipped: fetch already running");
            return None;
        }

        if config_changed {
            tracking.failures = 0;
        }
        tracking.last_config = Some(binding.fingerprint.clone());
        tracking.initialized = true;

        let cached = tracking.cache.get(&binding.fingerprint).cloned();
        let refresh = origin.is_revalidation();
        entry.dispatch_if(|state| {
            if state.loading {
                return false;
            }
            state.begin(refresh, cached, Utc::now());
            true
        });

        tracking.started = Some(Instant::now());
        tracking.running = true;
        if let Some(previous) = tracking.cancel.take() {
            debug!(%key, %origin, "superseding in-flight cycle");
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        tracking.cancel = Some(cancel.clone());
        tracking.generation += 1;

        debug!(%key, %origin, generation = tracking.generation, "cycle started");
        Some(Cycle {
            generation: tracking.generation,
            cancel,
        })
    }

    // ── Network ──────────────────────────────────────────────────────

    async fn fetch(
        &self,
        binding: &Binding,
        cancel: &CancellationToken,
    ) -> Result<(u16, Value), ApiError> {
        let fetcher = binding
            .config
            .fetcher
            .as_ref()
            .unwrap_or(&self.default_fetcher);
        let request = build_request(&binding.url, &binding.config, cancel.clone());

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = fetcher.fetch(request) => result?,
        };
        let status = response.status();
        let payload = response.into_payload()?;
        Ok((status, payload))
    }

    // ── Terminal transition ──────────────────────────────────────────

    fn commit(binding: &Binding, cycle: &Cycle, outcome: Result<(u16, Value), ApiError>) {
        let key = binding.key();
        let entry = &binding.entry;
        let mut tracking = entry.tracking();

        if tracking.generation != cycle.generation {
            debug!(%key, generation = cycle.generation, "discarding superseded response");
            return;
        }
        if matches!(&outcome, Err(e) if e.is_cancelled()) {
            trace!(%key, "cycle cancelled");
            return;
        }

        tracking.running = false;
        tracking.suspended = false;
        tracking.cancel = None;

        let end = Utc::now();
        let response_time = tracking.started.map(elapsed_millis);

        match outcome {
            Ok((status, payload)) => {
                tracking
                    .cache
                    .insert(binding.fingerprint.clone(), payload.clone());
                if status >= 400 {
                    tracking.failures = tracking.failures.saturating_add(1);
                    warn!(%key, status, failures = tracking.failures, "request failed");
                    entry.dispatch(|state| state.fail(Some(payload), Some(status), end, response_time));
                } else {
                    tracking.failures = 0;
                    debug!(%key, status, "request succeeded");
                    entry.dispatch(|state| state.succeed(payload, status, end, response_time));
                }
            }
            Err(e) => {
                tracking.failures = tracking.failures.saturating_add(1);
                warn!(%key, error = %e, failures = tracking.failures, "request failed");
                let status = e.status();
                entry.dispatch(|state| state.fail(None, status, end, response_time));
            }
        }
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
