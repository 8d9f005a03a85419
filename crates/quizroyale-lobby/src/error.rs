//! Error types for the lobby layer.

use quizroyale_protocol::PlayerId;

use crate::{LobbyId, LobbyPhase};

/// Errors that can occur during lobby and matchmaking operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// The lobby is past its waiting phase.
    #[error("lobby {0} is not joinable in phase {1}")]
    NotJoinable(LobbyId, LobbyPhase),

    /// Every seat in the lobby has been handed out.
    #[error("lobby {0} is full")]
    Full(LobbyId),

    /// The lobby's event loop has stopped.
    #[error("lobby {0} is closed")]
    Closed(LobbyId),

    /// The hub stopped before the client could be seated.
    #[error("matchmaking hub is gone")]
    Abandoned,

    /// The player is not registered in this lobby.
    #[error("player {0} not in lobby {1}")]
    UnknownPlayer(PlayerId, LobbyId),

    /// A configuration value is out of range.
    #[error("invalid lobby config: {0}")]
    InvalidConfig(String),
}
