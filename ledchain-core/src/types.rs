//! Domain types for a MAX7219 chain.
//!
//! A [`ModuleState`] is the displayable content of one chip; the chain's dirty
//! bookkeeping lives in [`ChainDevice`](crate::ChainDevice), not here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChainError;

/// Chain length used when nothing else configures one.
pub const DEFAULT_MODULES: usize = 1;

/// Longest chain accepted by [`ChainDevice::resize`](crate::ChainDevice::resize).
pub const MAX_MODULES: usize = 255;

// ---------------------------------------------------------------------------
// Brightness
// ---------------------------------------------------------------------------

/// MAX7219 intensity level, always within `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Brightness = Brightness(0);
    pub const MAX: Brightness = Brightness(15);
    pub const DEFAULT: Brightness = Brightness(8);

    /// Validate `level`; anything outside `0..=15` is `InvalidArgument`.
    pub fn new(level: i64) -> Result<Self, ChainError> {
        if (i64::from(Self::MIN.0)..=i64::from(Self::MAX.0)).contains(&level) {
            Ok(Self(level as u8))
        } else {
            Err(ChainError::InvalidArgument(format!(
                "brightness {level} outside 0..=15"
            )))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<i64> for Brightness {
    type Error = ChainError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Brightness> for u8 {
    fn from(b: Brightness) -> Self {
        b.0
    }
}

// ---------------------------------------------------------------------------
// Module state
// ---------------------------------------------------------------------------

/// Runtime content of one chip in the chain.
///
/// `value` is kept after a clear so the last number survives in persisted
/// state, but it is never rendered while `has_value` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleState {
    pub value: i32,
    pub has_value: bool,
    pub brightness: Brightness,
    pub powered: bool,
}

impl Default for ModuleState {
    fn default() -> Self {
        Self {
            value: 0,
            has_value: false,
            brightness: Brightness::DEFAULT,
            powered: true,
        }
    }
}

impl ModuleState {
    /// The displayed number, or `None` when the module is blank.
    pub fn displayed(&self) -> Option<i32> {
        self.has_value.then_some(self.value)
    }
}

// ---------------------------------------------------------------------------
// Index helpers
// ---------------------------------------------------------------------------

/// Convert a 1-based module number (as users type it) into a zero-based index.
///
/// Numbers below 1 or above `count` are `OutOfRange`; the reported index is
/// the zero-based position that was asked for, saturating at `i64::MIN`.
pub fn module_index(number: i64, count: usize) -> Result<usize, ChainError> {
    match number.checked_sub(1).map(usize::try_from) {
        Some(Ok(i)) if i < count => Ok(i),
        _ => Err(ChainError::OutOfRange {
            index: number.saturating_sub(1),
            count,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
