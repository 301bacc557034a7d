//! Error types for the deferred pool

use thiserror::Error;

/// Configuration errors, one per offending option
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No draw count was configured
    #[error("Option `draw_counts` must not be empty")]
    EmptyDrawCounts,

    /// A configured draw count is outside 1..=7
    #[error("Option `draw_counts` contains {0}, expected values between 1 and 7")]
    DrawCountOutOfRange(u8),

    /// Cache target must be positive
    #[error("Option `cache_target` must be at least 1")]
    ZeroCacheTarget,

    /// Worker count must be positive
    #[error("Option `workers` must be at least 1")]
    ZeroWorkers,

    /// Search budget must be positive
    #[error("Option `search_budget` must be at least 1")]
    ZeroSearchBudget,

    /// Generator idle interval must be positive
    #[error("Option `generator_idle` must be longer than zero")]
    ZeroGeneratorIdle,

    /// An environment override could not be parsed
    #[error("Environment variable {var} has invalid value {value:?}")]
    InvalidEnvVar { var: &'static str, value: String },
}

/// Errors returned by [`DeferredSolver`](crate::DeferredSolver)
#[derive(Error, Debug)]
pub enum PoolError {
    /// Construction rejected the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The requested draw count is not one the pool was configured with
    #[error("Draw count {0} is not configured for this pool")]
    UnknownDrawCount(u8),

    /// The pool was stopped
    #[error("Deferred solver has been stopped")]
    Stopped,

    /// Every worker exited, so no further results can arrive
    #[error("Result queue disconnected")]
    Disconnected,

    /// No result arrived within the requested time
    #[error("Timed out waiting for a solved deal")]
    Timeout,

    /// Background thread pool creation failed
    #[error("Thread pool creation failed: {0}")]
    ThreadPool(String),
}
