// ── Revalidator: engine context and resource handles ──
//
// `Revalidator` owns every piece of per-key state (registry, bookkeeping,
// default fetcher, environment bus) and is passed around by cheap clone.
// `Resource` is one caller's subscription to a key.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use refetch_api::{Fetcher, HttpFetcher};

use crate::config::{RequestConfig, RevalidatorConfig};
use crate::coordinator::{Binding, Coordinator, Origin};
use crate::error::CoreError;
use crate::key::ResourceKey;
use crate::state::RequestState;
use crate::store::Registry;
use crate::stream::StateStream;
use crate::trigger::{EnvEvent, EnvSignals, Watcher};

// ── Revalidator ──────────────────────────────────────────────────────

/// The engine context. Cheaply cloneable via `Arc` inner.
///
/// Every [`Resource`] opened from the same `Revalidator` shares its
/// per-key containers: two callers requesting the same key observe the
/// same state and never fetch it twice concurrently.
#[derive(Debug, Clone)]
pub struct Revalidator {
    inner: Arc<RevalidatorInner>,
}

#[derive(Debug)]
struct RevalidatorInner {
    config: RevalidatorConfig,
    registry: Registry,
    coordinator: Coordinator,
    signals: EnvSignals,
}

impl Revalidator {
    /// Create an engine backed by the default HTTP fetcher.
    pub fn new(config: RevalidatorConfig) -> Result<Self, CoreError> {
        let fetcher = HttpFetcher::new(config.transport.clone())?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create an engine with a custom default fetcher.
    pub fn with_fetcher(config: RevalidatorConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            inner: Arc::new(RevalidatorInner {
                config,
                registry: Registry::new(),
                coordinator: Coordinator::new(fetcher),
                signals: EnvSignals::new(),
            }),
        }
    }

    pub fn config(&self) -> &RevalidatorConfig {
        &self.inner.config
    }

    /// Open `url` under `config` and start its initial cycle.
    ///
    /// Without `suspense` the cycle runs in the background and the returned
    /// handle observes it. With `suspense`, this waits for the key's first
    /// load; a second suspense opener of a key still loading waits for
    /// that load to settle.
    pub async fn open(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<Resource, CoreError> {
        let binding = self.bind(url.into(), config)?;
        debug!(key = %binding.key(), suspense = binding.config.suspense, "opening resource");
        let resource = Resource::new(self.clone(), Arc::clone(&binding));

        if binding.config.suspense {
            self.suspend(&binding).await;
        } else {
            let coordinator = self.inner.coordinator.clone();
            tokio::spawn(async move { mount(&coordinator, &binding).await });
        }
        Ok(resource)
    }

    /// Current state of `key`, if it has been opened.
    pub fn state(&self, key: &ResourceKey) -> Option<RequestState> {
        self.inner.registry.get(key).map(|entry| entry.snapshot())
    }

    pub fn subscribe(&self, key: &ResourceKey) -> Option<StateStream> {
        self.inner
            .registry
            .get(key)
            .map(|entry| StateStream::new(entry.subscribe()))
    }

    /// Overwrite `key`'s data without fetching.
    ///
    /// Loading, outcome flags, status and the failure counter are left
    /// untouched.
    pub fn mutate(&self, key: &ResourceKey, data: impl Into<Value>) -> Result<(), CoreError> {
        let entry = self
            .inner
            .registry
            .get(key)
            .ok_or_else(|| CoreError::UnknownKey {
                key: key.to_string(),
            })?;
        entry.mutate(data.into());
        Ok(())
    }

    /// Publish a "became visible" signal to every watcher.
    pub fn notify_focus(&self) -> usize {
        self.inner.signals.notify(EnvEvent::Focus)
    }

    /// Publish a "connectivity restored" signal to every watcher.
    pub fn notify_reconnect(&self) -> usize {
        self.inner.signals.notify(EnvEvent::Reconnect)
    }

    pub fn signals(&self) -> &EnvSignals {
        &self.inner.signals
    }

    /// Every key referenced so far.
    pub fn keys(&self) -> Vec<ResourceKey> {
        self.inner.registry.keys()
    }

    pub(crate) fn coordinator(&self) -> &Coordinator {
        &self.inner.coordinator
    }

    fn bind(&self, url: String, config: RequestConfig) -> Result<Arc<Binding>, CoreError> {
        let config = config.with_defaults(&self.inner.config.defaults);
        Binding::resolve(&self.inner.registry, url, config).map(Arc::new)
    }

    async fn suspend(&self, binding: &Binding) {
        let entry = &binding.entry;
        // An abandoned first load wakes waiters with the marker cleared, so
        // one of them claims it and runs the load itself.
        loop {
            let mut states = entry.subscribe();
            {
                let mut tracking = entry.tracking();
                if !tracking.suspended {
                    if !tracking.initialized && binding.config.is_auto() {
                        tracking.suspended = true;
                    }
                    break;
                }
            }
            debug!(key = %binding.key(), "waiting on in-flight first load");
            if states.wait_for(|s| !s.loading).await.is_err() {
                break;
            }
        }
        mount(&self.inner.coordinator, binding).await;
    }
}

/// The initial cycle, then the config-change cycle for auto resources.
async fn mount(coordinator: &Coordinator, binding: &Binding) {
    coordinator.initiate_cycle(binding, Origin::Mount).await;
    if binding.config.is_auto() {
        coordinator
            .initiate_cycle(binding, Origin::ConfigChange)
            .await;
    }
}

// ── Resource ─────────────────────────────────────────────────────────

/// One caller's handle on a key. Cheaply cloneable.
#[derive(Debug, Clone)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

#[derive(Debug)]
struct ResourceInner {
    revalidator: Revalidator,
    binding: watch::Sender<Arc<Binding>>,
}

impl Resource {
    fn new(revalidator: Revalidator, binding: Arc<Binding>) -> Self {
        let (binding, _) = watch::channel(binding);
        Self {
            inner: Arc::new(ResourceInner {
                revalidator,
                binding,
            }),
        }
    }

    fn binding(&self) -> Arc<Binding> {
        Arc::clone(&self.inner.binding.borrow())
    }

    pub(crate) fn bindings(&self) -> watch::Receiver<Arc<Binding>> {
        self.inner.binding.subscribe()
    }

    pub(crate) fn revalidator(&self) -> &Revalidator {
        &self.inner.revalidator
    }

    pub fn key(&self) -> ResourceKey {
        self.binding().key().clone()
    }

    pub fn url(&self) -> String {
        self.binding().url.clone()
    }

    /// The resolved configuration (engine defaults applied).
    pub fn config(&self) -> Arc<RequestConfig> {
        Arc::clone(&self.binding().config)
    }

    pub fn state(&self) -> RequestState {
        self.binding().entry.snapshot()
    }

    /// Subscribe to the current key's state changes.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.binding().entry.subscribe())
    }

    /// Forced revalidation, superseding any cycle in flight.
    pub async fn revalidate(&self) -> RequestState {
        let binding = self.binding();
        self.inner
            .revalidator
            .coordinator()
            .initiate_cycle(&binding, Origin::Manual)
            .await
    }

    /// Optimistically overwrite this key's data.
    pub fn mutate(&self, data: impl Into<Value>) {
        self.binding().entry.mutate(data.into());
    }

    /// Point the handle at a new locator/configuration and run the
    /// config-change trigger.
    ///
    /// If the key-bearing options changed, the handle moves to the new key;
    /// the old key's state is left as it was.
    pub async fn reconfigure(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<RequestState, CoreError> {
        let binding = self.inner.revalidator.bind(url.into(), config)?;
        let previous = self.inner.binding.send_replace(Arc::clone(&binding));
        if previous.key() != binding.key() {
            info!(from = %previous.key(), to = %binding.key(), "resource re-keyed");
        }
        mount(self.inner.revalidator.coordinator(), &binding).await;
        Ok(binding.entry.snapshot())
    }

    /// Wait until the current key is not loading.
    pub async fn settled(&self) -> RequestState {
        let entry = Arc::clone(&self.binding().entry);
        let mut states = entry.subscribe();
        match states.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => entry.snapshot(),
        }
    }

    /// Register the interval, retry and environment triggers for as long
    /// as the returned [`Watcher`] lives.
    pub fn watch(&self) -> Watcher {
        Watcher::spawn(self.clone())
    }

    /// Consecutive failed cycles for the current key.
    pub fn failures(&self) -> u32 {
        Coordinator::failures(&self.binding().entry)
    }

    /// A fetch is in flight for the current key.
    pub fn is_running(&self) -> bool {
        Coordinator::is_running(&self.binding().entry)
    }
}
