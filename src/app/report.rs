use std::io::{self, Write};

use crate::consumer::WorkerReport;

/// Result of a completed run, assembled by the aggregator after every
/// worker has been joined.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Sum of every consumer's private sum.
    pub total: i64,
    /// Values the producer published.
    pub values_produced: u64,
    /// Cancel requests the interruptor issued.
    pub cancel_requests: u64,
    pub workers: Vec<WorkerReport>,
}

impl RunReport {
    pub fn new(values_produced: u64, cancel_requests: u64, workers: Vec<WorkerReport>) -> Self {
        let total = workers
            .iter()
            .fold(0i64, |acc, worker| acc.wrapping_add(worker.sum));
        Self {
            total,
            values_produced,
            cancel_requests,
            workers,
        }
    }

    /// Values drained across all consumers.
    pub fn values_drained(&self) -> u64 {
        self.workers.iter().map(|w| w.drained).sum()
    }

    /// Write the grand total as a single line.
    pub fn write_total<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", self.total)?;
        out.flush()
    }

    /// Cancel requests consumers saw and ignored.
    pub fn cancels_ignored(&self) -> u64 {
        self.workers.iter().map(|w| w.ignored_cancels).sum()
    }
}
