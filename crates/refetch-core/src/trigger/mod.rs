// ── Revalidation triggers ──
//
// Independent observers of one resource that call into the coordinator:
// a fixed-interval timer, an error-backoff retry, and environment-event
// listeners. A `Watcher` owns them; dropping it cancels every timer and
// listener it registered. The config-change trigger lives on `Resource`
// itself, since it runs whenever the resource is reconfigured.

mod env;
mod interval;
mod retry;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

pub use env::{EnvEvent, EnvSignals};

use crate::coordinator::{Binding, Coordinator, Origin};
use crate::revalidator::Resource;

/// Run a cycle in the background. Cycles are detached: stopping a watcher
/// stops new cycles, not one already in flight.
pub(crate) fn spawn_cycle(coordinator: &Coordinator, binding: &Arc<Binding>, origin: Origin) {
    let coordinator = coordinator.clone();
    let binding = Arc::clone(binding);
    tokio::spawn(async move {
        coordinator.initiate_cycle(&binding, origin).await;
    });
}

/// Scoped lifetime of a resource's revalidation triggers.
///
/// Created by [`Resource::watch`]. Triggers follow the resource across
/// [`Resource::reconfigure`]: the old set is torn down and a new one
/// registered for the new configuration.
pub struct Watcher {
    cancel: CancellationToken,
    _guard: DropGuard,
    task: Option<JoinHandle<()>>,
}

impl Watcher {
    pub(crate) fn spawn(resource: Resource) -> Self {
        let cancel = CancellationToken::new();
        let mut bindings = resource.bindings();
        let binding = Arc::clone(&bindings.borrow_and_update());

        // Register the first set synchronously so events published right
        // after `watch()` returns are not missed.
        let scope = cancel.child_token();
        let tasks = register(&resource, &binding, &scope);
        let task = tokio::spawn(supervise(resource, bindings, cancel.clone(), scope, tasks));

        Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            task: Some(task),
        }
    }

    /// Triggers are still registered.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel every trigger and wait until they have shut down.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Keep one trigger set registered for the resource's current binding.
async fn supervise(
    resource: Resource,
    mut bindings: watch::Receiver<Arc<Binding>>,
    cancel: CancellationToken,
    mut scope: CancellationToken,
    mut tasks: Vec<JoinHandle<()>>,
) {
    loop {
        let rebound = tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            changed = bindings.changed() => changed.is_ok(),
        };

        scope.cancel();
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        if !rebound {
            break;
        }

        let binding = Arc::clone(&bindings.borrow_and_update());
        debug!(key = %binding.key(), "re-registering triggers");
        scope = cancel.child_token();
        tasks = register(&resource, &binding, &scope);
    }
}

fn register(
    resource: &Resource,
    binding: &Arc<Binding>,
    scope: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let coordinator = resource.revalidator().coordinator();
    let config = &binding.config;
    let mut tasks = Vec::new();

    // A fixed interval takes precedence over error retries.
    if let Some(period) = config.interval() {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tasks.push(tokio::spawn(interval::interval_task(
            coordinator.clone(),
            Arc::clone(binding),
            ticker,
            scope.clone(),
        )));
    } else if let Some(delay) = config.retry_delay().filter(|_| config.attempt_limit() > 0) {
        tasks.push(tokio::spawn(retry::retry_task(
            coordinator.clone(),
            Arc::clone(binding),
            binding.entry.subscribe(),
            delay,
            scope.clone(),
        )));
    }

    if config.on_focus() || config.on_reconnect() {
        tasks.push(tokio::spawn(env::env_task(
            coordinator.clone(),
            Arc::clone(binding),
            resource.revalidator().signals().subscribe(),
            scope.clone(),
        )));
    }

    debug!(key = %binding.key(), triggers = tasks.len(), "triggers registered");
    tasks
}
