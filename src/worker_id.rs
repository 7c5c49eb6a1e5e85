//! Readable per-thread identifiers for debug output.

use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static WORKER_ID: usize = NEXT_ID.fetch_add(1, Ordering::Relaxed);
}

/// Id of the calling thread, assigned on first use and stable afterwards.
/// Ids are unique within the process and start at 1.
pub fn current() -> usize {
    WORKER_ID.with(|id| *id)
}
