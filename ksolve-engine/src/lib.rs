//! Klondike Solver Engine Interface
//!
//! The narrow seam between the deferred pool of solved deals and whatever
//! actually plays Klondike. A solver is a stateful, single-threaded object that
//! can be seeded to a deterministic deal, reset, and asked to search for a
//! solution within a bounded budget.
//!
//! # Overview
//!
//! This library provides:
//! - [`SolverEngine`]: the trait a solver implements
//! - [`EngineFactory`]: how the pool builds one engine per thread
//! - [`DrawCount`]: validated draw count (`1..=7`), the pool's partition key
//! - [`SolveOutcome`]: classification of a single bounded search
//! - [`CancelToken`]: cooperative cancellation checked inside long searches
//!
//! With the `simulated` feature, `SimulatedEngine` deals real layouts from a
//! seed but decides solvability from a hash, which is enough to drive the pool
//! in tests.
//!
//! # Quick Example
//!
//! ```
//! use ksolve_engine::{DrawCount, SolveOutcome};
//!
//! let draw = DrawCount::new(3).unwrap();
//! assert_eq!(draw.get(), 3);
//! assert!(DrawCount::new(8).is_err());
//!
//! assert!(SolveOutcome::from_code(-1).is_solved());
//! assert!(!SolveOutcome::from_code(-2).is_solved());
//! ```

mod cancel;
mod draw_count;
mod engine;
mod error;
mod outcome;

#[cfg(feature = "simulated")]
mod simulated;

pub use cancel::CancelToken;
pub use draw_count::DrawCount;
pub use engine::{EngineFactory, SolverEngine};
pub use error::DrawCountError;
pub use outcome::SolveOutcome;

#[cfg(feature = "simulated")]
pub use simulated::SimulatedEngine;
