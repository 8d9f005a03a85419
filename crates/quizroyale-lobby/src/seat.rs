//! Hand-off types between a client actor and the lobby that seats it.
//!
//! A client actor is built before matchmaking. It hands the hub a
//! [`PendingClient`] (its name and outbound queue) and waits for a
//! [`Seat`] in return: its player id, a handle to its lobby and the
//! receiving end of the lobby's command channel.

use std::fmt;

use quizroyale_game::Powerup;
use quizroyale_protocol::{PlayerId, ServerMessage};
use tokio::sync::{mpsc, oneshot};

use crate::LobbyHandle;

/// A client's outbound message queue. The client's send task is the only
/// consumer.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerMessage>;

/// Lobby → client actor commands.
pub type CommandSender = mpsc::UnboundedSender<ClientCommand>;
pub type CommandReceiver = mpsc::UnboundedReceiver<ClientCommand>;

/// Instructions a lobby gives one of its client actors.
///
/// These change the actor's own game state, which only the actor itself
/// may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Reset and start answering questions.
    StartGame,
    /// An opponent's power-up landed on this player.
    Afflict(Powerup),
    /// The player was eliminated; stop playing.
    Retire,
}

/// A client waiting for the hub to place it.
pub struct PendingClient {
    pub(crate) name: String,
    pub(crate) outbound: OutboundSender,
    pub(crate) seat: oneshot::Sender<Seat>,
}

impl PendingClient {
    /// Creates a pending client and the receiver its [`Seat`] arrives on.
    ///
    /// If the client is never seated (the hub stopped), the receiver
    /// reports a closed channel.
    pub fn new(
        name: impl Into<String>,
        outbound: OutboundSender,
    ) -> (Self, oneshot::Receiver<Seat>) {
        let (seat, seat_rx) = oneshot::channel();
        let pending = Self {
            name: name.into(),
            outbound,
            seat,
        };
        (pending, seat_rx)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for PendingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingClient")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A client's place in a lobby.
#[derive(Debug)]
pub struct Seat {
    pub player_id: PlayerId,
    pub lobby: LobbyHandle,
    pub commands: CommandReceiver,
}
