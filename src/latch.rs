//! One-shot countdown barrier used to hold the producer and the interruptor
//! until every consumer has checked in.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Countdown latch. Once the count reaches zero it stays there.
#[derive(Debug)]
pub struct StartupLatch {
    count: Mutex<usize>,
    zero: Condvar,
}

impl StartupLatch {
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Signal that one participant is ready. Wakes every waiter when the
    /// count hits zero; extra calls after that are ignored.
    pub fn count_down(&self) {
        let mut count = self.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Block until the count is zero. Returns immediately if it already is.
    pub fn wait(&self) {
        let mut count = self.lock();
        while *count > 0 {
            count = self
                .zero
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Number of participants that have not checked in yet.
    pub fn remaining(&self) -> usize {
        *self.lock()
    }

    // The counter is a plain integer, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
