// ── Reactive per-key store ──
//
// One observable container per resource key, with push-based change
// notification and out-of-band bookkeeping.

mod entry;
mod registry;

pub(crate) use entry::{KeyEntry, KeyTracking};
pub(crate) use registry::Registry;
