use clap::Parser;
use log::LevelFilter;

/// Command line interface definition for handoff-sum.
#[derive(Parser, Debug)]
#[command(name = "handoff-sum")]
#[command(about = "Sum a line of integers through a single-slot producer/consumer handoff")]
#[command(version)]
pub struct Cli {
    /// Number of consumer threads (at least 1)
    #[arg(value_name = "CONSUMERS")]
    pub consumers: usize,

    /// Upper bound in milliseconds for each consumer's sleep after a drain
    #[arg(value_name = "MAX_SLEEP_MS")]
    pub max_sleep_ms: u64,

    /// Print `<worker-id> <running-sum>` for every drained value
    #[arg(long)]
    pub debug: bool,

    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-q` and the `-v` count. Defaults to warnings.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
