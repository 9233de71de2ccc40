// ── Fixed-interval revalidation ──

use std::sync::Arc;

use tokio::time::Interval;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::spawn_cycle;
use crate::coordinator::{Binding, Coordinator, Origin};

/// Issue a forced revalidation on every tick. The coordinator's gate skips
/// ticks that land while a fetch is still running.
pub(super) async fn interval_task(
    coordinator: Coordinator,
    binding: Arc<Binding>,
    mut ticker: Interval,
    cancel: CancellationToken,
) {
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                trace!(key = %binding.key(), "interval tick");
                spawn_cycle(&coordinator, &binding, Origin::Interval);
            }
        }
    }
}
