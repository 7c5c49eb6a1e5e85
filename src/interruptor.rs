//! Chaos worker that keeps asking random consumers to stop while the
//! producer is running.

use std::thread;

use log::debug;
use rand::seq::SliceRandom;

use crate::cancel::CancelToken;
use crate::latch::StartupLatch;
use crate::slot::HandoffSlot;

pub struct Interruptor<'a> {
    slot: &'a HandoffSlot,
    latch: &'a StartupLatch,
    targets: &'a [CancelToken],
}

impl<'a> Interruptor<'a> {
    pub fn new(slot: &'a HandoffSlot, latch: &'a StartupLatch, targets: &'a [CancelToken]) -> Self {
        Self {
            slot,
            latch,
            targets,
        }
    }

    /// Issue cancel requests against uniformly chosen targets until the
    /// producer finishes. Returns the number of requests issued.
    ///
    /// The finished check and the request are not atomic, so one request may
    /// land after the stream has ended.
    pub fn run(&self) -> u64 {
        self.latch.wait();

        let mut rng = rand::thread_rng();
        let mut issued = 0;
        while !self.slot.is_finished() {
            let Some(target) = self.targets.choose(&mut rng) else {
                break;
            };
            target.request();
            issued += 1;
            thread::yield_now();
        }

        debug!("Interruptor issued {} cancel requests", issued);
        issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stops_once_producer_finished() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(0);
        let targets = vec![CancelToken::new(), CancelToken::new(), CancelToken::new()];

        let issued = thread::scope(|s| {
            let interruptor = s.spawn(|| Interruptor::new(&slot, &latch, &targets).run());
            thread::sleep(Duration::from_millis(50));
            slot.finish();
            interruptor.join().unwrap()
        });

        let recorded: u64 = targets.iter().map(CancelToken::requested).sum();
        assert_eq!(issued, recorded);
        assert!(issued > 0);
    }

    #[test]
    fn test_finished_before_start_issues_nothing() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(0);
        let targets = vec![CancelToken::new()];
        slot.finish();

        assert_eq!(Interruptor::new(&slot, &latch, &targets).run(), 0);
        assert_eq!(targets[0].requested(), 0);
    }

    #[test]
    fn test_no_targets_issues_nothing() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(0);

        assert_eq!(Interruptor::new(&slot, &latch, &[]).run(), 0);
    }

    #[test]
    fn test_waits_for_latch() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(1);
        let targets = vec![CancelToken::new()];

        thread::scope(|s| {
            let interruptor = s.spawn(|| Interruptor::new(&slot, &latch, &targets).run());
            thread::sleep(Duration::from_millis(20));
            assert_eq!(targets[0].requested(), 0);

            latch.count_down();
            slot.finish();
            interruptor.join().unwrap();
        });
    }
}
