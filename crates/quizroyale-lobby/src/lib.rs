//! Lobbies and matchmaking for Quizroyale.
//!
//! Each lobby runs as an isolated Tokio task (actor model) that drives
//! one game from the waiting phase through elimination rounds to its
//! close. The hub is a single task that places new clients into lobbies.
//!
//! # Key types
//!
//! - [`Hub`] / [`HubHandle`]: matchmaking, fullest lobby first
//! - [`LobbyHandle`]: register players and report events to a lobby
//! - [`LobbyEvent`]: everything a lobby reacts to
//! - [`PendingClient`] / [`Seat`]: the hand-off between client and lobby
//! - [`LobbyConfig`] / [`LobbyPhase`]: settings and lifecycle

mod config;
mod error;
mod hub;
mod lobby;
mod roster;
mod seat;

pub use config::{LobbyConfig, LobbyPhase};
pub use error::LobbyError;
pub use hub::{Hub, HubHandle, placement_order};
pub use lobby::{LobbyEvent, LobbyHandle, LobbyId, LobbyInfo, Rejected};
pub use roster::{MemberStatus, select_for_elimination};
pub use seat::{
    ClientCommand, CommandReceiver, CommandSender, OutboundReceiver,
    OutboundSender, PendingClient, Seat,
};
