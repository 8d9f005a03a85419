//! Lobby configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::LobbyError;

// ---------------------------------------------------------------------------
// LobbyConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every lobby the hub opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Most players one lobby will ever register. Player ids are one byte,
    /// so this must stay within `1..=255`.
    pub capacity: usize,

    /// How long a lobby waits for players before the game starts anyway.
    pub waiting_period_secs: u64,

    /// Time between elimination rounds.
    pub elimination_interval_secs: u64,

    /// Players removed per elimination round.
    pub eliminations_per_tick: usize,

    /// Start as soon as the lobby reaches capacity instead of waiting out
    /// the timer.
    pub start_when_full: bool,

    /// Let a unanimous `SkipWait` vote start the game early.
    pub allow_skip_wait: bool,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            capacity: 40,
            waiting_period_secs: 60,
            elimination_interval_secs: 30,
            eliminations_per_tick: 3,
            start_when_full: true,
            allow_skip_wait: true,
        }
    }
}

impl LobbyConfig {
    pub const MAX_CAPACITY: usize = u8::MAX as usize;

    pub fn validate(&self) -> Result<(), LobbyError> {
        if self.capacity == 0 || self.capacity > Self::MAX_CAPACITY {
            return Err(LobbyError::InvalidConfig(format!(
                "capacity must be within 1..={}, got {}",
                Self::MAX_CAPACITY,
                self.capacity
            )));
        }
        if self.elimination_interval_secs == 0 {
            return Err(LobbyError::InvalidConfig(
                "elimination_interval_secs must be at least 1".into(),
            ));
        }
        if self.eliminations_per_tick == 0 {
            return Err(LobbyError::InvalidConfig(
                "eliminations_per_tick must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn waiting_period(&self) -> Duration {
        Duration::from_secs(self.waiting_period_secs)
    }

    pub fn elimination_interval(&self) -> Duration {
        Duration::from_secs(self.elimination_interval_secs)
    }
}

// ---------------------------------------------------------------------------
// LobbyPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a lobby.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Waiting → Active → Closed
/// ```
///
/// A lobby that empties while waiting skips straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyPhase {
    Waiting,
    Active,
    Closed,
}

impl LobbyPhase {
    /// Returns `true` if the lobby still registers new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if the transition to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Active)
                | (Self::Waiting, Self::Closed)
                | (Self::Active, Self::Closed)
        )
    }
}

impl std::fmt::Display for LobbyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Active => write!(f, "Active"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
