use std::io::BufRead;

use log::{debug, warn};

use crate::cancel;
use crate::input::{parse_values, read_line};
use crate::latch::StartupLatch;
use crate::slot::HandoffSlot;

/// Feeds one line of integers into the slot, one value at a time.
pub struct Producer<'a> {
    slot: &'a HandoffSlot,
    latch: &'a StartupLatch,
    ctrlc: bool,
}

impl<'a> Producer<'a> {
    pub fn new(slot: &'a HandoffSlot, latch: &'a StartupLatch) -> Self {
        Self {
            slot,
            latch,
            ctrlc: false,
        }
    }

    /// Install the Ctrl+C handler once the input line has been read.
    ///
    /// Until then SIGINT keeps its default behaviour, so a run blocked on
    /// input can still be killed.
    pub fn with_ctrlc_handler(mut self) -> Self {
        self.ctrlc = true;
        self
    }

    /// Wait for every consumer, publish each input value, then finish the
    /// stream. Returns the number of values published.
    ///
    /// Malformed input, read failures and Ctrl+C while publishing all end the
    /// stream the same way a natural end of input does.
    pub fn run<R: BufRead>(&self, reader: R) -> u64 {
        self.latch.wait();
        debug!("Producer released");

        let line = read_line(reader);
        if self.ctrlc {
            cancel::register_handler();
        }

        let mut produced = 0;
        for value in parse_values(&line) {
            if cancel::is_cancelled() {
                warn!("Interrupted, no more values will be produced");
                break;
            }
            self.slot.produce(value);
            produced += 1;
        }

        self.slot.finish();
        debug!("Producer finished after {} values", produced);
        produced
    }
}
