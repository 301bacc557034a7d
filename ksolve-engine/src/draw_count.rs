//! Draw count: the number of cards turned from the stock at a time

use crate::error::DrawCountError;
use std::fmt;

/// A validated draw count in `1..=7`.
///
/// Draw count is the partition key of the deferred pool: every solved deal is
/// solved for exactly one draw count and cached under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawCount(u8);

impl DrawCount {
    /// Smallest supported draw count
    pub const MIN: u8 = 1;
    /// Largest supported draw count
    pub const MAX: u8 = 7;

    /// Validate a raw draw count
    pub fn new(value: u8) -> Result<Self, DrawCountError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DrawCountError::OutOfRange(value))
        }
    }

    /// The raw value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for DrawCount {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for DrawCount {
    type Error = DrawCountError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DrawCount> for u8 {
    fn from(value: DrawCount) -> Self {
        value.0
    }
}

impl fmt::Display for DrawCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
