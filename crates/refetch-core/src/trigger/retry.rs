// ── Error-backoff retry ──
//
// Watches a key's state; each newly completed failed cycle schedules one
// retry after the backoff delay, until the consecutive-failure counter
// reaches the attempt ceiling.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::spawn_cycle;
use crate::coordinator::{Binding, Coordinator, Origin};
use crate::state::RequestState;

pub(super) async fn retry_task(
    coordinator: Coordinator,
    binding: Arc<Binding>,
    mut states: watch::Receiver<RequestState>,
    delay: Duration,
    cancel: CancellationToken,
) {
    let key = binding.key();
    let limit = binding.config.attempt_limit();
    let mut handled: Option<DateTime<Utc>> = None;

    loop {
        let failed_at = failed_cycle_end(&states.borrow_and_update());
        if failed_at.is_some() && failed_at != handled {
            handled = failed_at;
            let failures = Coordinator::failures(&binding.entry);
            if failures < limit {
                debug!(%key, failures, limit, ?delay, "scheduling retry");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
                if failed_cycle_end(&binding.entry.snapshot()) == failed_at {
                    spawn_cycle(&coordinator, &binding, Origin::Retry);
                }
            } else {
                debug!(%key, failures, "retry ceiling reached");
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

/// End timestamp of the last cycle if it settled in error.
fn failed_cycle_end(state: &RequestState) -> Option<DateTime<Utc>> {
    if state.error && !state.loading {
        state.end
    } else {
        None
    }
}
