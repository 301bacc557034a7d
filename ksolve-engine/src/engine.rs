//! Core engine trait and factory

use crate::cancel::CancelToken;
use crate::draw_count::DrawCount;
use crate::outcome::SolveOutcome;

/// A stateful, single-threaded Klondike solver.
///
/// One engine holds one game at a time: it is seeded to a deterministic deal,
/// reset to that deal's initial layout and then asked to search for a
/// solution within a bounded budget. Search state is not shareable, so the
/// deferred pool gives every worker thread its own engine.
///
/// # Example
///
/// ```
/// use ksolve_engine::{CancelToken, DrawCount, SolveOutcome, SolverEngine};
///
/// /// Solves every even seed in a single move.
/// #[derive(Default)]
/// struct EvenSeeds {
///     draw_count: DrawCount,
///     seed: i64,
///     solved: bool,
/// }
///
/// impl SolverEngine for EvenSeeds {
///     fn set_draw_count(&mut self, draw_count: DrawCount) {
///         self.draw_count = draw_count;
///     }
///
///     fn draw_count(&self) -> DrawCount {
///         self.draw_count
///     }
///
///     fn seed(&mut self, seed: i64) -> i64 {
///         self.seed = seed.abs();
///         self.seed
///     }
///
///     fn reset_to_initial_deal(&mut self) {
///         self.solved = false;
///     }
///
///     fn attempt_bounded_search(&mut self, _budget: u64, _cancel: &CancelToken) -> SolveOutcome {
///         self.solved = self.seed % 2 == 0;
///         if self.solved { SolveOutcome::SolvedMinimal } else { SolveOutcome::Impossible }
///     }
///
///     fn describe_moves(&self) -> String {
///         if self.solved { "AUTO".to_string() } else { String::new() }
///     }
///
///     fn render_initial_diagram(&self) -> String {
///         format!("deal #{} (draw {})", self.seed, self.draw_count)
///     }
///
///     fn solved_card_count(&self) -> u32 {
///         if self.solved { 52 } else { 0 }
///     }
/// }
///
/// let mut engine = EvenSeeds::default();
/// engine.set_draw_count(DrawCount::new(3).unwrap());
/// assert_eq!(engine.seed(-4), 4);
/// engine.reset_to_initial_deal();
/// assert!(engine.attempt_bounded_search(1_000, &CancelToken::new()).is_solved());
/// assert_eq!(engine.solved_card_count(), 52);
/// ```
pub trait SolverEngine {
    /// Set how many cards are turned from the stock at a time
    fn set_draw_count(&mut self, draw_count: DrawCount);

    /// Current draw count
    fn draw_count(&self) -> DrawCount;

    /// Shuffle a deterministic deal for `seed`.
    ///
    /// Returns the seed actually applied. Engines may normalize their input
    /// (a negative seed typically maps to a different non-negative one), but
    /// the same input must always produce the same deal.
    fn seed(&mut self, seed: i64) -> i64;

    /// Restore the initial layout of the current deal
    fn reset_to_initial_deal(&mut self);

    /// Search for a solution, visiting at most `budget` states.
    ///
    /// Engines that can stop mid-search should poll `cancel` at a fixed
    /// interval and return [`SolveOutcome::CouldNotComplete`] once it fires.
    /// Engines that ignore it are still correct: the attempt then runs until
    /// the budget is exhausted.
    fn attempt_bounded_search(&mut self, budget: u64, cancel: &CancelToken) -> SolveOutcome;

    /// Human-readable summary of the moves made by the last search
    fn describe_moves(&self) -> String;

    /// Textual snapshot of the current layout
    fn render_initial_diagram(&self) -> String;

    /// Number of cards currently on the foundations
    fn solved_card_count(&self) -> u32;
}

/// Thread-safe factory producing one engine per caller.
///
/// The pool calls [`create`](Self::create) once on each worker thread and once
/// for the consumer's private materialization engine, so the engine type
/// itself never has to cross threads.
///
/// Any `Fn() -> E + Send + Sync` closure is a factory:
///
/// ```
/// use ksolve_engine::EngineFactory;
/// # use ksolve_engine::{CancelToken, DrawCount, SolveOutcome, SolverEngine};
/// # #[derive(Default)]
/// # struct Noop;
/// # impl SolverEngine for Noop {
/// #     fn set_draw_count(&mut self, _: DrawCount) {}
/// #     fn draw_count(&self) -> DrawCount { DrawCount::default() }
/// #     fn seed(&mut self, seed: i64) -> i64 { seed }
/// #     fn reset_to_initial_deal(&mut self) {}
/// #     fn attempt_bounded_search(&mut self, _: u64, _: &CancelToken) -> SolveOutcome {
/// #         SolveOutcome::Impossible
/// #     }
/// #     fn describe_moves(&self) -> String { String::new() }
/// #     fn render_initial_diagram(&self) -> String { String::new() }
/// #     fn solved_card_count(&self) -> u32 { 0 }
/// # }
///
/// fn build<F: EngineFactory>(factory: &F) -> F::Engine {
///     factory.create()
/// }
///
/// let _engine = build(&Noop::default);
/// ```
pub trait EngineFactory: Send + Sync + 'static {
    /// Engine type produced by this factory
    type Engine: SolverEngine;

    /// Build a fresh engine
    fn create(&self) -> Self::Engine;
}

impl<F, E> EngineFactory for F
where
    F: Fn() -> E + Send + Sync + 'static,
    E: SolverEngine,
{
    type Engine = E;

    fn create(&self) -> E {
        self()
    }
}
