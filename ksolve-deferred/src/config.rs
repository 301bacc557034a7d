//! Pool configuration and validation

use crate::error::ConfigError;
use ksolve_engine::DrawCount;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable overriding [`PoolConfig::draw_counts`] (comma separated)
pub const ENV_DRAW_COUNTS: &str = "KSOLVE_DRAW_COUNTS";
/// Environment variable overriding [`PoolConfig::cache_target`]
pub const ENV_CACHE_TARGET: &str = "KSOLVE_CACHE_TARGET";
/// Environment variable overriding [`PoolConfig::workers`]
pub const ENV_WORKERS: &str = "KSOLVE_WORKERS";
/// Environment variable overriding [`PoolConfig::search_budget`]
pub const ENV_SEARCH_BUDGET: &str = "KSOLVE_SEARCH_BUDGET";

/// Unvalidated pool configuration.
///
/// Build it with the `with_*` methods and hand it to
/// [`DeferredSolver::new`](crate::DeferredSolver::new), which validates it
/// once before any thread is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Draw counts to keep solved deals for, in round-robin order
    pub draw_counts: Vec<u8>,
    /// Solved deals to keep in flight per draw count
    pub cache_target: usize,
    /// Number of worker threads, each owning one engine
    pub workers: usize,
    /// State budget handed to every bounded search
    pub search_budget: u64,
    /// How long the generator waits between throttle checks
    pub generator_idle: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            draw_counts: vec![1, 3],
            cache_target: 5,
            workers: 3,
            search_budget: 1_000_000,
            generator_idle: Duration::from_millis(1),
        }
    }
}

impl PoolConfig {
    /// Set the draw counts to cache
    pub fn with_draw_counts(mut self, draw_counts: impl IntoIterator<Item = u8>) -> Self {
        self.draw_counts = draw_counts.into_iter().collect();
        self
    }

    /// Set the per draw count cache target
    pub fn with_cache_target(mut self, cache_target: usize) -> Self {
        self.cache_target = cache_target;
        self
    }

    /// Set the number of workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the search budget per attempt
    pub fn with_search_budget(mut self, search_budget: u64) -> Self {
        self.search_budget = search_budget;
        self
    }

    /// Set the generator idle interval
    pub fn with_generator_idle(mut self, generator_idle: Duration) -> Self {
        self.generator_idle = generator_idle;
        self
    }

    /// Defaults overridden by `KSOLVE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from a variable lookup (environment, test fixture, ...)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DRAW_COUNTS) {
            self.draw_counts = value
                .split(',')
                .map(|part| parse_var(ENV_DRAW_COUNTS, part.trim(), &value))
                .collect::<Result<_, _>>()?;
        }
        if let Some(value) = lookup(ENV_CACHE_TARGET) {
            self.cache_target = parse_var(ENV_CACHE_TARGET, value.trim(), &value)?;
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            self.workers = parse_var(ENV_WORKERS, value.trim(), &value)?;
        }
        if let Some(value) = lookup(ENV_SEARCH_BUDGET) {
            self.search_budget = parse_var(ENV_SEARCH_BUDGET, value.trim(), &value)?;
        }
        Ok(self)
    }

    /// Check every option, reporting the first one that is invalid
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        if self.draw_counts.is_empty() {
            return Err(ConfigError::EmptyDrawCounts);
        }
        let mut draw_counts: Vec<DrawCount> = Vec::with_capacity(self.draw_counts.len());
        for &raw in &self.draw_counts {
            let draw_count =
                DrawCount::new(raw).map_err(|_| ConfigError::DrawCountOutOfRange(raw))?;
            if !draw_counts.contains(&draw_count) {
                draw_counts.push(draw_count);
            }
        }
        if self.cache_target == 0 {
            return Err(ConfigError::ZeroCacheTarget);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.search_budget == 0 {
            return Err(ConfigError::ZeroSearchBudget);
        }
        if self.generator_idle.is_zero() {
            return Err(ConfigError::ZeroGeneratorIdle);
        }

        Ok(ValidatedConfig {
            draw_counts,
            cache_target: self.cache_target,
            workers: self.workers,
            search_budget: self.search_budget,
            generator_idle: self.generator_idle,
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str, raw: &str, full: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
        var,
        value: full.to_string(),
    })
}

/// Configuration that passed validation; immutable for the pool's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    draw_counts: Vec<DrawCount>,
    cache_target: usize,
    workers: usize,
    search_budget: u64,
    generator_idle: Duration,
}

impl ValidatedConfig {
    /// Distinct draw counts in round-robin order
    pub fn draw_counts(&self) -> &[DrawCount] {
        &self.draw_counts
    }

    /// Solved deals to keep in flight per draw count
    pub fn cache_target(&self) -> usize {
        self.cache_target
    }

    /// Number of worker loops
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// State budget for every bounded search
    pub fn search_budget(&self) -> u64 {
        self.search_budget
    }

    /// Pause between generator throttle checks
    pub fn generator_idle(&self) -> Duration {
        self.generator_idle
    }

    /// Result queue depth at which the generator stops submitting jobs
    pub fn throttle_limit(&self) -> usize {
        self.cache_target.saturating_mul(self.draw_counts.len())
    }

    /// Whether `draw_count` is one of the configured draw counts
    pub fn lookup(&self, draw_count: u8) -> Option<DrawCount> {
        self.draw_counts
            .iter()
            .copied()
            .find(|dc| dc.get() == draw_count)
    }
}
