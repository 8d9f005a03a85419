//! Bounded numeric types for difficulty and multipliers.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// A question difficulty level, always within `1..=10`.
///
/// Every constructor and arithmetic helper clamps, so an out-of-range
/// level cannot be represented.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(10);

    /// Creates a level, clamping into `1..=10`.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Raises the level by `steps`, stopping at 10.
    pub fn raised(self, steps: u8) -> Self {
        Self::new(self.0.saturating_add(steps))
    }

    /// Lowers the level by `steps`, stopping at 1.
    pub fn lowered(self, steps: u8) -> Self {
        Self::new(self.0.saturating_sub(steps))
    }

    pub fn is_max(self) -> bool {
        self == Self::MAX
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<u8> for Difficulty {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Multiplier
// ---------------------------------------------------------------------------

/// A score or coin multiplier, held as whole percent (100 = ×1.0).
///
/// Applying it truncates toward zero: 10 coins at ×1.25 is 12.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Multiplier(u32);

impl Multiplier {
    pub const ONE: Self = Self(100);

    pub fn from_percent(percent: u32) -> Self {
        Self(percent)
    }

    pub fn percent(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub fn increased(self, percent: u32) -> Self {
        Self(self.0.saturating_add(percent))
    }

    /// Decreases by `percent`, flooring at zero.
    pub fn decreased(self, percent: u32) -> Self {
        Self(self.0.saturating_sub(percent))
    }

    /// Scales `base`, truncating the fractional part.
    pub fn apply(self, base: u32) -> u32 {
        let scaled = u64::from(base) * u64::from(self.0) / 100;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{:.2}", self.as_f64())
    }
}
