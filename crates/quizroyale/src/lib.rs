//! # Quizroyale
//!
//! Server for a real-time elimination quiz game. Players connect over
//! WebSocket, are packed into lobbies, answer arithmetic questions for
//! points and coins, spend coins on power-ups, and the lowest scorers are
//! eliminated on a fixed interval until one player is left.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizroyale::prelude::*;
//!
//! # async fn start() -> Result<(), QuizError> {
//! let server = QuizServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod actor;
mod config;
mod error;
pub mod logging;
mod server;

pub use actor::ClientActor;
pub use config::ServerConfig;
pub use error::QuizError;
pub use server::{QuizServer, QuizServerBuilder};

/// Re-exports of the most commonly used types.
pub mod prelude {
    pub use crate::{ClientActor, QuizError, QuizServer, QuizServerBuilder, ServerConfig};
    pub use quizroyale_game::{GameConfig, Powerup};
    pub use quizroyale_lobby::{HubHandle, LobbyConfig, LobbyInfo, LobbyPhase};
    pub use quizroyale_protocol::{
        ClientMessage, PlayerEntry, PlayerId, ServerMessage, Wire,
    };
}
