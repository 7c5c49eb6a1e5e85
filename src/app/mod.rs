mod report;

use std::io::{self, BufRead};
use std::thread::{self, Scope, ScopedJoinHandle};

use log::{debug, error, info};

use crate::cancel::CancelToken;
use crate::config::{ConfigError, RunConfig};
use crate::consumer::{Consumer, Reporter};
use crate::interruptor::Interruptor;
use crate::latch::StartupLatch;
use crate::producer::Producer;
use crate::slot::HandoffSlot;

pub use report::RunReport;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Worker thread '{0}' panicked")]
    WorkerPanicked(String),
}

/// Wires the producer, the interruptor and the consumer pool together and
/// aggregates the consumers' sums.
pub struct App {
    config: RunConfig,
    ctrlc: bool,
}

impl App {
    /// Validate `config`. Nothing is started if it is rejected.
    pub fn new(config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ctrlc: false,
        })
    }

    /// Let Ctrl+C end the stream early once input has been read.
    pub fn with_ctrlc_handler(mut self) -> Self {
        self.ctrlc = true;
        self
    }

    /// Run the whole pipeline over the first line of `reader`.
    ///
    /// `reporter` only receives drain notifications when debug output is
    /// enabled in the config.
    pub fn run<R: BufRead + Send>(
        &self,
        reader: R,
        reporter: &dyn Reporter,
    ) -> Result<RunReport, AppError> {
        let consumers = self.config.consumers;
        let max_sleep_ms = self.config.max_sleep_ms;
        let reporter = self.config.debug.then_some(reporter);

        let slot = HandoffSlot::new();
        let latch = StartupLatch::new(consumers);
        let tokens: Vec<CancelToken> = (0..consumers).map(|_| CancelToken::new()).collect();

        info!(
            "Starting {} consumers (max sleep {} ms)",
            consumers, max_sleep_ms
        );

        let report = thread::scope(|s| -> Result<RunReport, AppError> {
            let mut workers = Vec::with_capacity(consumers);
            for (i, token) in tokens.iter().enumerate() {
                let mut consumer = Consumer::new(&slot, &latch, token.clone(), max_sleep_ms);
                if let Some(reporter) = reporter {
                    consumer = consumer.with_reporter(reporter);
                }
                match spawn(s, format!("consumer-{}", i), move || consumer.run()) {
                    Ok(handle) => workers.push(handle),
                    Err(err) => {
                        abandon_startup(&slot, &latch);
                        drain_handles(workers);
                        return Err(err.into());
                    }
                }
            }

            let interruptor = match spawn(s, "interruptor".to_string(), || {
                Interruptor::new(&slot, &latch, &tokens).run()
            }) {
                Ok(handle) => handle,
                Err(err) => {
                    abandon_startup(&slot, &latch);
                    drain_handles(workers);
                    return Err(err.into());
                }
            };

            let mut producer = Producer::new(&slot, &latch);
            if self.ctrlc {
                producer = producer.with_ctrlc_handler();
            }
            let producer = match spawn(s, "producer".to_string(), move || producer.run(reader)) {
                Ok(handle) => handle,
                Err(err) => {
                    abandon_startup(&slot, &latch);
                    let _ = interruptor.join();
                    drain_handles(workers);
                    return Err(err.into());
                }
            };

            let produced = join(producer).inspect_err(|_| slot.finish());
            let issued = join(interruptor);
            let results: Vec<_> = workers.into_iter().map(join).collect();

            let workers = results.into_iter().collect::<Result<Vec<_>, _>>()?;
            Ok(RunReport::new(produced?, issued?, workers))
        })?;

        info!(
            "Produced {} values, drained {}, total {}",
            report.values_produced,
            report.values_drained(),
            report.total
        );
        debug!(
            "{} cancel requests issued, {} ignored by consumers",
            report.cancel_requests,
            report.cancels_ignored()
        );
        if report.values_drained() != report.values_produced {
            error!(
                "Drained {} values but {} were produced",
                report.values_drained(),
                report.values_produced
            );
        }

        Ok(report)
    }
}

fn spawn<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: String,
    f: F,
) -> io::Result<ScopedJoinHandle<'scope, T>>
where
    T: Send + 'scope,
    F: FnOnce() -> T + Send + 'scope,
{
    thread::Builder::new().name(name).spawn_scoped(scope, f)
}

fn join<T>(handle: ScopedJoinHandle<'_, T>) -> Result<T, AppError> {
    let name = handle.thread().name().unwrap_or("unnamed").to_string();
    handle.join().map_err(|_| AppError::WorkerPanicked(name))
}

/// Release every thread blocked on startup or on the slot so the scope can
/// be joined after a failed spawn.
fn abandon_startup(slot: &HandoffSlot, latch: &StartupLatch) {
    while latch.remaining() > 0 {
        latch.count_down();
    }
    slot.finish();
}

fn drain_handles<T>(handles: Vec<ScopedJoinHandle<'_, T>>) {
    for handle in handles {
        let _ = handle.join();
    }
}
