//! Scoring constants and power-up magnitudes.

use serde::{Deserialize, Serialize};

use crate::{GameError, Powerup, PowerupCatalog};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Tunable game rules. Every field has a default, so a partial JSON
/// object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Points for a correct answer at ×1.0.
    pub points_per_correct: u32,

    /// Coins for a correct answer at ×1.0.
    pub coins_per_correct: u32,

    /// Consecutive correct answers that raise difficulty by one.
    pub streak_for_level_up: u32,

    /// Multiplier gain from the coin and score multiplier power-ups, in
    /// percent.
    pub multiplier_step_percent: u32,

    /// Coin multiplier loss from a coin leak, in percent.
    pub coin_leak_percent: u32,

    /// Levels removed by easy mode.
    pub easy_mode_levels: u8,

    /// Levels added by hard mode.
    pub hard_mode_levels: u8,

    /// Cost of each power-up, indexed by power-up id.
    pub powerup_costs: [u32; Powerup::ALL.len()],
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.streak_for_level_up == 0 {
            return Err(GameError::InvalidConfig(
                "streak_for_level_up must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn catalog(&self) -> PowerupCatalog {
        PowerupCatalog::from_config(self)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            points_per_correct: 100,
            coins_per_correct: 10,
            streak_for_level_up: 5,
            multiplier_step_percent: 10,
            coin_leak_percent: 10,
            easy_mode_levels: 2,
            hard_mode_levels: 5,
            powerup_costs: PowerupCatalog::DEFAULT_COSTS,
        }
    }
}
