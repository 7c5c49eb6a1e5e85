//! Cancellation: the process-wide Ctrl+C flag and per-worker cancel tokens.
//!
//! Worker cancellation is cooperative. The interruptor only records a
//! request on a [`CancelToken`]; the worker decides at its next checkpoint
//! what to do with it. A worker that has disabled cancellation drops the
//! requests on the floor.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

static CANCELLED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been pressed.
pub fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::SeqCst)
}

/// Register the Ctrl+C handler.
///
/// When Ctrl+C is pressed the flag is set and the producer stops publishing
/// at its next value. Registering a second time is a no-op.
pub fn register_handler() {
    let _ = ctrlc::set_handler(move || {
        CANCELLED.store(true, Ordering::SeqCst);
    });
}

/// Outcome of a [`CancelToken::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// No request arrived since the last checkpoint.
    Continue,
    /// Requests arrived but cancellation is disabled; this many were dropped.
    Ignored(u64),
    /// Cancellation is enabled and was requested.
    Cancel,
}

#[derive(Debug)]
struct TokenInner {
    enabled: AtomicBool,
    pending: AtomicU64,
    requested: AtomicU64,
}

/// Cancel request channel for one worker. Clones share state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    /// Create a token with cancellation enabled and nothing requested.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                enabled: AtomicBool::new(true),
                pending: AtomicU64::new(0),
                requested: AtomicU64::new(0),
            }),
        }
    }

    /// Ask the owning worker to stop.
    pub fn request(&self) {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        self.inner.requested.fetch_add(1, Ordering::SeqCst);
    }

    /// Make the owning worker immune to requests from now on.
    pub fn disable(&self) {
        self.inner.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Total requests ever issued against this token.
    pub fn requested(&self) -> u64 {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Consume pending requests and report what the worker should do.
    pub fn checkpoint(&self) -> Checkpoint {
        let pending = self.inner.pending.swap(0, Ordering::SeqCst);
        match (pending, self.is_enabled()) {
            (0, _) => Checkpoint::Continue,
            (_, true) => Checkpoint::Cancel,
            (n, false) => Checkpoint::Ignored(n),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
