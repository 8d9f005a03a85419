//! Error types for the game rules.

/// Reasons a player request is refused.
///
/// None of these are reported to the client; the actor logs them and
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The power-up id is outside the catalog.
    #[error("invalid power-up id {0}")]
    InvalidPowerupId(u8),

    /// The player cannot afford the power-up.
    #[error("insufficient balance: costs {cost}, have {balance}")]
    InsufficientBalance { cost: u32, balance: u32 },

    /// Purchases are only accepted while the game is running.
    #[error("not currently playing")]
    NotPlaying,

    /// A configuration value is out of range.
    #[error("invalid game config: {0}")]
    InvalidConfig(String),
}
