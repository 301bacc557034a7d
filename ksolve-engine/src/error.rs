//! Error types for the engine interface

use thiserror::Error;

/// Error type for draw count validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawCountError {
    /// Klondike deals only support drawing between 1 and 7 cards from the stock
    #[error("Draw count {0} is out of range (expected 1..=7)")]
    OutOfRange(u8),
}
