//! Run configuration.
//!
//! Settings are layered: defaults, then environment, then command line.
//! The consumer count and sleep bound are required positionals, so the
//! environment only carries:
//! - `HANDOFF_DEBUG` - emit a line per drained value (`1`/`true`/`yes`)

use std::env;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Consumer count must be at least 1")]
    NoConsumers,
}

/// Parameters of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of consumer workers.
    pub consumers: usize,
    /// Each consumer sleeps a random `[0, max_sleep_ms]` after a drain.
    pub max_sleep_ms: u64,
    /// Emit `<worker-id> <running-sum>` for each drained value.
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            consumers: 1,
            max_sleep_ms: 0,
            debug: false,
        }
    }
}

impl RunConfig {
    pub fn new(consumers: usize, max_sleep_ms: u64) -> Self {
        Self {
            consumers,
            max_sleep_ms,
            debug: false,
        }
    }

    /// Create config from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = env::var("HANDOFF_DEBUG") {
            config.debug = parse_flag(&value);
        }

        config
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Merge with CLI values. CLI values take precedence; a `false` debug
    /// flag leaves the environment's choice alone.
    pub fn with_overrides(mut self, consumers: usize, max_sleep_ms: u64, debug: bool) -> Self {
        self.consumers = consumers;
        self.max_sleep_ms = max_sleep_ms;
        if debug {
            self.debug = true;
        }
        self
    }

    /// Check preconditions that must hold before any worker starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consumers == 0 {
            return Err(ConfigError::NoConsumers);
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
