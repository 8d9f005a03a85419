//! The power-up catalog.

use std::fmt;

use crate::{GameConfig, GameError};

/// A purchasable power-up. The discriminant is its wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Powerup {
    /// Raises the buyer's coin multiplier.
    CoinMultiplier = 0,
    /// Raises the buyer's score multiplier.
    ScoreMultiplier = 1,
    /// Replaces the buyer's current question.
    SkipQuestion = 2,
    /// Lowers the buyer's difficulty.
    EasyMode = 3,
    /// The target must enter its next correct answer twice.
    DoubleTap = 4,
    /// Lowers the target's coin multiplier.
    CoinLeak = 5,
    /// Raises the target's difficulty.
    HardMode = 6,
}

impl Powerup {
    pub const ALL: [Self; 7] = [
        Self::CoinMultiplier,
        Self::ScoreMultiplier,
        Self::SkipQuestion,
        Self::EasyMode,
        Self::DoubleTap,
        Self::CoinLeak,
        Self::HardMode,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Whether the effect lands on an opponent rather than the buyer.
    pub fn targets_opponent(self) -> bool {
        matches!(self, Self::DoubleTap | Self::CoinLeak | Self::HardMode)
    }

    /// Whether the effect wears off. Coin leaks are permanent and stay
    /// listed on the target for the rest of the game.
    pub fn expires(self) -> bool {
        matches!(self, Self::DoubleTap | Self::HardMode)
    }
}

impl fmt::Display for Powerup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CoinMultiplier => "coin-multiplier",
            Self::ScoreMultiplier => "score-multiplier",
            Self::SkipQuestion => "skip-question",
            Self::EasyMode => "easy-mode",
            Self::DoubleTap => "double-tap",
            Self::CoinLeak => "coin-leak",
            Self::HardMode => "hard-mode",
        };
        f.write_str(name)
    }
}

/// Read-only table of power-up costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerupCatalog {
    costs: [u32; Powerup::ALL.len()],
}

impl PowerupCatalog {
    pub const DEFAULT_COSTS: [u32; Powerup::ALL.len()] =
        [20, 30, 50, 200, 200, 300, 500];

    pub fn new(costs: [u32; Powerup::ALL.len()]) -> Self {
        Self { costs }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.powerup_costs)
    }

    pub fn cost(&self, powerup: Powerup) -> u32 {
        self.costs[usize::from(powerup.id())]
    }

    /// Resolves a wire id to a power-up and its cost.
    pub fn lookup(&self, id: u8) -> Result<(Powerup, u32), GameError> {
        let powerup =
            Powerup::from_id(id).ok_or(GameError::InvalidPowerupId(id))?;
        Ok((powerup, self.cost(powerup)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Powerup, u32)> + '_ {
        Powerup::ALL.iter().map(|p| (*p, self.cost(*p)))
    }
}

impl Default for PowerupCatalog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COSTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_table_order() {
        for (i, p) in Powerup::ALL.iter().enumerate() {
            assert_eq!(usize::from(p.id()), i);
            assert_eq!(Powerup::from_id(p.id()), Some(*p));
        }
        assert_eq!(Powerup::from_id(7), None);
    }

    #[test]
    fn test_default_costs() {
        let catalog = PowerupCatalog::default();
        assert_eq!(catalog.cost(Powerup::CoinMultiplier), 20);
        assert_eq!(catalog.cost(Powerup::ScoreMultiplier), 30);
        assert_eq!(catalog.cost(Powerup::SkipQuestion), 50);
        assert_eq!(catalog.cost(Powerup::EasyMode), 200);
        assert_eq!(catalog.cost(Powerup::DoubleTap), 200);
        assert_eq!(catalog.cost(Powerup::CoinLeak), 300);
        assert_eq!(catalog.cost(Powerup::HardMode), 500);
    }

    #[test]
    fn test_lookup_rejects_out_of_range() {
        let catalog = PowerupCatalog::default();
        assert_eq!(
            catalog.lookup(255),
            Err(GameError::InvalidPowerupId(255))
        );
        assert_eq!(catalog.lookup(6), Ok((Powerup::HardMode, 500)));
    }

    #[test]
    fn test_targeting() {
        let opponent: Vec<_> = Powerup::ALL
            .iter()
            .filter(|p| p.targets_opponent())
            .collect();
        assert_eq!(
            opponent,
            vec![&Powerup::DoubleTap, &Powerup::CoinLeak, &Powerup::HardMode]
        );
        assert!(!Powerup::CoinLeak.expires());
    }
}
