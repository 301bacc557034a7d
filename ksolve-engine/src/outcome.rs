//! Classification of a single bounded search attempt

use std::fmt;

/// Outcome reported by a [`SolverEngine`](crate::SolverEngine) after one
/// bounded search.
///
/// Engines speak in integer codes; the sign of a solved code only says whether
/// the solution is proven minimal. The deferred pool accepts both solved
/// variants and discards everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveOutcome {
    /// A solution was found and it uses the fewest possible moves
    SolvedMinimal,
    /// A solution was found but it may not be minimal
    SolvedMayNotBeMinimal,
    /// The deal is proven unsolvable
    Impossible,
    /// The search budget ran out (or the search was cancelled) first
    CouldNotComplete,
    /// Any code the engine reports that is not one of the above
    Unknown(i32),
}

impl SolveOutcome {
    /// Decode an engine outcome code
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::SolvedMinimal,
            -1 => Self::SolvedMayNotBeMinimal,
            0 => Self::Impossible,
            -2 => Self::CouldNotComplete,
            other => Self::Unknown(other),
        }
    }

    /// The engine outcome code
    pub fn code(self) -> i32 {
        match self {
            Self::SolvedMinimal => 1,
            Self::SolvedMayNotBeMinimal => -1,
            Self::Impossible => 0,
            Self::CouldNotComplete => -2,
            Self::Unknown(code) => code,
        }
    }

    /// True when the code magnitude is exactly 1, minimal or not
    pub fn is_solved(self) -> bool {
        self.code().unsigned_abs() == 1
    }
}

impl From<i32> for SolveOutcome {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SolvedMinimal => write!(f, "solved (minimal)"),
            Self::SolvedMayNotBeMinimal => write!(f, "solved (may not be minimal)"),
            Self::Impossible => write!(f, "impossible"),
            Self::CouldNotComplete => write!(f, "could not complete"),
            Self::Unknown(code) => write!(f, "unknown outcome code {}", code),
        }
    }
}
