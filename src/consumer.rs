use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};
use rand::Rng;

use crate::cancel::{CancelToken, Checkpoint};
use crate::latch::StartupLatch;
use crate::slot::HandoffSlot;
use crate::worker_id;

/// Receives one notification per drained value, called while the slot lock
/// is held so notifications follow drain order.
pub trait Reporter: Sync {
    fn drained(&self, worker: usize, running_sum: i64);
}

/// Writes `<worker-id> <running-sum>` lines to stdout.
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn drained(&self, worker: usize, running_sum: i64) {
        let mut stdout = io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{} {}", worker, running_sum) {
            warn!("Failed to write debug line: {}", err);
        }
    }
}

/// What one consumer did over its lifetime. Built once, when it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub sum: i64,
    pub drained: u64,
    pub ignored_cancels: u64,
}

/// A worker that pulls values from the slot and keeps a private running sum.
pub struct Consumer<'a> {
    slot: &'a HandoffSlot,
    latch: &'a StartupLatch,
    token: CancelToken,
    max_sleep_ms: u64,
    reporter: Option<&'a dyn Reporter>,
}

impl<'a> Consumer<'a> {
    pub fn new(
        slot: &'a HandoffSlot,
        latch: &'a StartupLatch,
        token: CancelToken,
        max_sleep_ms: u64,
    ) -> Self {
        Self {
            slot,
            latch,
            token,
            max_sleep_ms,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Drain values until the producer finishes, sleeping a random interval
    /// in `[0, max_sleep_ms]` after each one.
    ///
    /// Cancellation is disabled before the worker signals readiness, so every
    /// request the interruptor issues is ignored and a value taken from the
    /// slot always makes it into the sum.
    pub fn run(self) -> WorkerReport {
        self.token.disable();
        self.latch.count_down();
        self.latch.wait();

        let mut report = WorkerReport {
            id: worker_id::current(),
            sum: 0,
            drained: 0,
            ignored_cancels: 0,
        };
        let mut rng = rand::thread_rng();

        loop {
            if !self.checkpoint(&mut report) {
                break;
            }

            let id = report.id;
            let sum = &mut report.sum;
            let reporter = self.reporter;
            let drained = self.slot.consume_with(|value| {
                *sum = sum.wrapping_add(value);
                if let Some(reporter) = reporter {
                    reporter.drained(id, *sum);
                }
            });
            if drained.is_none() {
                break;
            }
            report.drained += 1;

            let sleep_ms = rng.gen_range(0..=self.max_sleep_ms);
            if sleep_ms > 0 {
                thread::sleep(Duration::from_millis(sleep_ms));
            }
        }

        // Account for requests that landed after the last loop checkpoint.
        self.checkpoint(&mut report);
        debug!(
            "Worker {} done: {} values, sum {}, {} cancel requests ignored",
            report.id, report.drained, report.sum, report.ignored_cancels
        );
        report
    }

    /// Returns false if the worker should stop.
    fn checkpoint(&self, report: &mut WorkerReport) -> bool {
        match self.token.checkpoint() {
            Checkpoint::Continue => true,
            Checkpoint::Ignored(n) => {
                trace!("Worker {} ignoring {} cancel requests", report.id, n);
                report.ignored_cancels += n;
                true
            }
            Checkpoint::Cancel => {
                debug!("Worker {} cancelled", report.id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        lines: Mutex<Vec<(usize, i64)>>,
    }

    impl Reporter for RecordingReporter {
        fn drained(&self, worker: usize, running_sum: i64) {
            self.lines.lock().unwrap().push((worker, running_sum));
        }
    }

    #[test]
    fn test_single_consumer_sums_all_values() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(1);

        let report = thread::scope(|s| {
            let worker = s.spawn(|| Consumer::new(&slot, &latch, CancelToken::new(), 0).run());
            latch.wait();
            for value in [3, -1, 10] {
                slot.produce(value);
            }
            slot.finish();
            worker.join().unwrap()
        });

        assert_eq!(report.sum, 12);
        assert_eq!(report.drained, 3);
    }

    #[test]
    fn test_consumer_reports_running_sums() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(1);
        let reporter = RecordingReporter::default();

        let report = thread::scope(|s| {
            let worker = s.spawn(|| {
                Consumer::new(&slot, &latch, CancelToken::new(), 0)
                    .with_reporter(&reporter)
                    .run()
            });
            for value in [1, 2, 3] {
                slot.produce(value);
            }
            slot.finish();
            worker.join().unwrap()
        });

        let lines = reporter.lines.lock().unwrap();
        let sums: Vec<i64> = lines.iter().map(|(_, sum)| *sum).collect();
        assert_eq!(sums, vec![1, 3, 6]);
        assert!(lines.iter().all(|(id, _)| *id == report.id));
    }

    #[test]
    fn test_cancel_requests_are_ignored() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(1);
        let token = CancelToken::new();

        let report = thread::scope(|s| {
            let worker = {
                let token = token.clone();
                s.spawn(|| Consumer::new(&slot, &latch, token, 0).run())
            };
            latch.wait();
            for value in 1..=50 {
                token.request();
                slot.produce(value);
            }
            slot.finish();
            worker.join().unwrap()
        });

        assert!(!token.is_enabled());
        assert_eq!(report.sum, (1..=50).sum::<i64>());
        assert_eq!(report.drained, 50);
        assert_eq!(report.ignored_cancels, 50);
    }

    #[test]
    fn test_finished_stream_yields_empty_report() {
        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(1);
        slot.finish();

        let report = Consumer::new(&slot, &latch, CancelToken::new(), 5).run();

        assert_eq!(report.sum, 0);
        assert_eq!(report.drained, 0);
        assert_eq!(latch.remaining(), 0);
    }
}
