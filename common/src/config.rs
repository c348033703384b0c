//! Configuration types for runtime and execution settings

/// Runtime configuration for tokio and thread pools
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    /// Number of worker threads (0 = number of CPU cores)
    pub max_workers: usize,
    /// Number of blocking threads (0 = tokio default of 512)
    pub max_blocking_threads: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThrottleConfig {
    /// Directory entries visited per second (0 = no throttle)
    pub ops_throttle: usize,
}

impl ThrottleConfig {
    /// Tokens added per replenish tick and the tick interval.
    ///
    /// Rates divisible by 10 are spread over 100ms ticks, anything else is refilled once a second.
    #[must_use]
    pub fn replenish_schedule(&self) -> (usize, std::time::Duration) {
        if self.ops_throttle % 10 == 0 {
            (self.ops_throttle / 10, std::time::Duration::from_millis(100))
        } else {
            (self.ops_throttle, std::time::Duration::from_secs(1))
        }
    }
}

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress diagnostics
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub fn level(&self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        if self.quiet {
            return LevelFilter::OFF;
        }
        match self.verbose {
            0 => LevelFilter::ERROR,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
