//! Deferred Klondike Solver
//!
//! Keeps a warm pool of pre-solved Klondike deals so a caller asking for a
//! solvable game with a given draw count gets one without waiting for a search.
//!
//! # Overview
//!
//! A [`DeferredSolver`] runs three kinds of actors:
//! - one generator, which enqueues random seeds for the configured draw counts
//!   in round-robin order, throttled by the depth of the result queue
//! - a fixed number of workers, each owning a private
//!   [`SolverEngine`](ksolve_engine::SolverEngine) and running one bounded
//!   search per job; only solved deals are published
//! - the caller, which drains published results into per-draw-count buckets
//!   and pops the oldest entry on request
//!
//! Stopping is cooperative: [`DeferredSolver::stop`] signals every loop and
//! blocks until each one has acknowledged and its thread has exited.
//!
//! # Quick Example
//!
//! ```
//! use ksolve_deferred::{DeferredSolver, PoolConfig};
//! use ksolve_engine::SimulatedEngine;
//! use std::time::Duration;
//!
//! let config = PoolConfig::default()
//!     .with_draw_counts([1, 3])
//!     .with_cache_target(1)
//!     .with_workers(2)
//!     .with_search_budget(10_000);
//! let mut solver = DeferredSolver::new(config, SimulatedEngine::new)?;
//!
//! let game = solver.get_solved_timeout(3, Duration::from_secs(30))?;
//! assert!(game.seed >= 0);
//! assert!(game.diagram.contains("draw 3"));
//!
//! solver.stop();
//! # Ok::<(), ksolve_deferred::PoolError>(())
//! ```
//!
//! # Configuration
//!
//! [`PoolConfig`] carries the defaults and fluent setters, and
//! [`PoolConfig::from_env`] layers `KSOLVE_*` environment variables on top.
//! Validation happens once, in [`DeferredSolver::new`], and reports the
//! offending option through [`ConfigError`].

mod cache;
mod config;
mod error;
mod generator;
mod job;
mod pool;
mod shutdown;
mod stats;
mod worker;

pub use config::{
    ENV_CACHE_TARGET, ENV_DRAW_COUNTS, ENV_SEARCH_BUDGET, ENV_WORKERS, PoolConfig, ValidatedConfig,
};
pub use error::{ConfigError, PoolError};
pub use job::{Job, MAX_SEED, SolvedGame, SolvedResult};
pub use pool::DeferredSolver;
pub use shutdown::ShutdownState;
pub use stats::StatsSnapshot;
