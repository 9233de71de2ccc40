// ── Environment signals ──
//
// Process-wide "became visible" and "connectivity restored" notifications.
// Whoever embeds the engine (a UI shell, the CLI's stdin reader, a network
// monitor) publishes; every watcher with the matching option enabled
// revalidates its key.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::spawn_cycle;
use crate::coordinator::{Binding, Coordinator, Origin};

const SIGNAL_CAPACITY: usize = 16;

/// An environment event that may prompt revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvEvent {
    /// The consumer became visible / regained focus.
    Focus,
    /// Network connectivity was restored.
    Reconnect,
}

/// Broadcast bus for [`EnvEvent`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EnvSignals {
    tx: broadcast::Sender<EnvEvent>,
}

impl Default for EnvSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvSignals {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Returns how many listeners received it.
    pub fn notify(&self, event: EnvEvent) -> usize {
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(?event, delivered, "environment signal");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EnvEvent> {
        self.tx.subscribe()
    }
}

/// Revalidate on each enabled event until `cancel` fires.
pub(super) async fn env_task(
    coordinator: Coordinator,
    binding: Arc<Binding>,
    mut events: broadcast::Receiver<EnvEvent>,
    cancel: CancellationToken,
) {
    let on_focus = binding.config.on_focus();
    let on_reconnect = binding.config.on_reconnect();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(EnvEvent::Focus) if on_focus => {
                    spawn_cycle(&coordinator, &binding, Origin::Focus);
                }
                Ok(EnvEvent::Reconnect) if on_reconnect => {
                    spawn_cycle(&coordinator, &binding, Origin::Reconnect);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "environment listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}
