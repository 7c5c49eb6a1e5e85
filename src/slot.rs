//! Single-item buffer shared by the producer and every consumer.
//!
//! The slot alternates strictly between full and empty: a new value is only
//! written after the previous one was taken by some consumer. Which consumer
//! wins a value is up to the scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SlotState {
    value: Option<i64>,
    finished: bool,
}

/// Depth-1 handoff between one producer and many consumers.
#[derive(Debug, Default)]
pub struct HandoffSlot {
    state: Mutex<SlotState>,
    filled: Condvar,
    drained: Condvar,
    // Mirrors `SlotState::finished` for readers outside the handoff path.
    finished: AtomicBool,
}

impl HandoffSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value`, first waiting for any previous value to be taken.
    ///
    /// Returns as soon as the value is in the slot; the next call is what
    /// blocks until it has been drained.
    pub fn produce(&self, value: i64) {
        let mut state = self.lock();
        while state.value.is_some() {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.value = Some(value);
        self.filled.notify_all();
    }

    /// Mark the stream as ended and wake every consumer waiting for a value.
    ///
    /// A value still sitting in the slot remains available to consumers.
    pub fn finish(&self) {
        let mut state = self.lock();
        state.finished = true;
        self.finished.store(true, Ordering::Release);
        self.filled.notify_all();
    }

    /// Take the next value, blocking while the slot is empty and the
    /// producer is still running. `None` means the stream has ended.
    pub fn try_consume(&self) -> Option<i64> {
        self.consume_with(|value| value)
    }

    /// Like [`try_consume`](Self::try_consume), but runs `on_value` while the
    /// slot lock is still held, so side effects observe drains in order.
    ///
    /// `on_value` must not call back into this slot.
    pub fn consume_with<R>(&self, on_value: impl FnOnce(i64) -> R) -> Option<R> {
        let mut state = self.lock();
        while state.value.is_none() && !state.finished {
            state = self
                .filled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let value = state.value.take()?;
        let result = on_value(value);
        self.drained.notify_all();
        Some(result)
    }

    /// Whether [`finish`](Self::finish) has been called. Does not take the
    /// slot lock.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    // Every state transition is a single field write, so a poisoned guard
    // still holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_consume_after_produce() {
        let slot = HandoffSlot::new();
        slot.produce(7);
        assert_eq!(slot.try_consume(), Some(7));
    }

    #[test]
    fn test_finish_on_empty_slot_ends_stream() {
        let slot = HandoffSlot::new();
        slot.finish();
        assert!(slot.is_finished());
        assert_eq!(slot.try_consume(), None);
        assert_eq!(slot.try_consume(), None);
    }

    #[test]
    fn test_value_published_before_finish_is_still_delivered() {
        let slot = HandoffSlot::new();
        slot.produce(-3);
        slot.finish();
        assert_eq!(slot.try_consume(), Some(-3));
        assert_eq!(slot.try_consume(), None);
    }

    #[test]
    fn test_is_finished_does_not_need_the_lock() {
        let slot = HandoffSlot::new();
        {
            let _guard = slot.lock();
            assert!(!slot.is_finished());
        }
        slot.finish();
        let _guard = slot.lock();
        assert!(slot.is_finished());
    }

    #[test]
    fn test_finish_wakes_blocked_consumers() {
        let slot = Arc::new(HandoffSlot::new());
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || slot.try_consume())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        slot.finish();

        for consumer in consumers {
            assert_eq!(consumer.join().unwrap(), None);
        }
    }

    #[test]
    fn test_produce_blocks_until_previous_value_drained() {
        let slot = Arc::new(HandoffSlot::new());
        slot.produce(1);

        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.produce(2))
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        assert_eq!(slot.try_consume(), Some(1));
        producer.join().unwrap();
        assert_eq!(slot.try_consume(), Some(2));
    }

    #[test]
    fn test_consume_with_runs_under_lock() {
        let slot = HandoffSlot::new();
        slot.produce(5);
        let doubled = slot.consume_with(|value| value * 2);
        assert_eq!(doubled, Some(10));
    }

    #[test]
    fn test_values_delivered_in_order_exactly_once() {
        let slot = Arc::new(HandoffSlot::new());
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(value) = slot.try_consume() {
                        seen.push(value);
                    }
                    seen
                })
            })
            .collect();

        for value in 0..200 {
            slot.produce(value);
        }
        slot.finish();

        let mut all: Vec<i64> = Vec::new();
        for consumer in consumers {
            let seen = consumer.join().unwrap();
            assert!(seen.windows(2).all(|w| w[0] < w[1]));
            all.extend(seen);
        }
        all.sort_unstable();
        assert_eq!(all, (0..200).collect::<Vec<_>>());
    }
}
