//! Unified error type for the Quizroyale server.

use std::path::PathBuf;

use quizroyale_game::GameError;
use quizroyale_lobby::LobbyError;
use quizroyale_protocol::ProtocolError;
use quizroyale_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed frame, unknown opcode, oversized
    /// field).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lobby-level error (not joinable, closed, hub gone).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A game-rule error (unknown power-up, insufficient coins, bad
    /// scoring config).
    #[error(transparent)]
    Game(#[from] GameError),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`ServerConfig`].
    ///
    /// [`ServerConfig`]: crate::ServerConfig
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A server-level configuration value is out of range.
    #[error("invalid server config: {0}")]
    InvalidConfig(String),

    /// Logging could not be installed.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
