//! Values flowing through the pipeline

use ksolve_engine::DrawCount;

/// Largest seed the generator hands out
pub const MAX_SEED: i64 = (1 << 31) - 1;

/// A deal waiting for a solve attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub seed: i64,
    pub draw_count: DrawCount,
}

/// A deal a worker confirmed as solved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedResult {
    pub seed: i64,
    pub draw_count: DrawCount,
    /// Move summary reported by the worker's engine
    pub moves: String,
}

/// A solved deal ready to hand to a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedGame {
    /// Seed that reproduces the deal
    pub seed: i64,
    /// Layout of the deal before any move was made
    pub diagram: String,
    /// Moves that solve it
    pub moves: String,
}

impl SolvedGame {
    /// Split into `(seed, diagram, moves)`
    pub fn into_parts(self) -> (i64, String, String) {
        (self.seed, self.diagram, self.moves)
    }
}
