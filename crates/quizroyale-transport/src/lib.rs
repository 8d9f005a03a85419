//! Transport abstraction layer for Quizroyale.
//!
//! Provides the [`Transport`] and [`Connection`] traits. The rest of the
//! server only needs a message-oriented, order-preserving, reliable duplex
//! channel per player; the WebSocket implementation is one such channel.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::{BoxError, TransportError};
#[cfg(feature = "websocket")]
pub use websocket::{
    WebSocketConnection, WebSocketHandshake, WebSocketTransport,
};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// A connection that was accepted but not yet upgraded.
    type Handshake: Handshake<Connection = Self::Connection, Error = Self::Error>;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Waits for the next incoming connection.
    ///
    /// Returns as soon as the peer is accepted; the protocol upgrade is
    /// left to [`Handshake::complete`], so a peer that never finishes it
    /// holds up only its own task.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Handshake, Self::Error>> + Send;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// The protocol upgrade of an accepted connection.
pub trait Handshake: Send + 'static {
    /// The connection produced once the upgrade succeeds.
    type Connection: Connection;
    /// The error type for a failed upgrade.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the upgrade. Has no deadline of its own; callers bound it.
    fn complete(
        self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;

    /// The peer's address.
    fn peer_addr(&self) -> std::net::SocketAddr;
}

/// A single connection that can send and receive whole frames.
///
/// One task may call [`recv`](Self::recv) while another calls
/// [`send`](Self::send); implementations must not serialize the two
/// directions behind a single lock.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the peer closed the connection. Cancel-safe:
    /// dropping the future before it resolves loses no frame.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection from our side.
    ///
    /// A no-op when the peer has already closed it.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// The display name the client supplied when the connection was
    /// established (empty when none was given).
    fn display_name(&self) -> &str;
}

/// Extracts the `name` parameter from a URL query string.
///
/// The query is decoded as `application/x-www-form-urlencoded`; invalid
/// UTF-8 is replaced lossily. A missing parameter yields an empty name.
pub fn display_name_from_query(query: Option<&str>) -> String {
    query
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "name")
        })
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_display_name_missing_query() {
        assert_eq!(display_name_from_query(None), "");
        assert_eq!(display_name_from_query(Some("room=3")), "");
    }

    #[test]
    fn test_display_name_plain() {
        assert_eq!(display_name_from_query(Some("name=alice")), "alice");
        assert_eq!(
            display_name_from_query(Some("x=1&name=bob&y=2")),
            "bob"
        );
    }

    #[test]
    fn test_display_name_percent_and_plus() {
        assert_eq!(
            display_name_from_query(Some("name=Ada+Lovelace")),
            "Ada Lovelace"
        );
        assert_eq!(
            display_name_from_query(Some("name=J%C3%BCrgen%21")),
            "Jürgen!"
        );
    }

    #[test]
    fn test_display_name_broken_escape_kept_literally() {
        assert_eq!(display_name_from_query(Some("name=100%")), "100%");
        assert_eq!(display_name_from_query(Some("name=%zz")), "%zz");
    }

    #[test]
    fn test_display_name_signed_escape_kept_literally() {
        assert_eq!(display_name_from_query(Some("name=a%+1b")), "a% 1b");
        assert_eq!(display_name_from_query(Some("name=a%-1b")), "a%-1b");
    }

    #[test]
    fn test_display_name_first_occurrence_wins() {
        assert_eq!(
            display_name_from_query(Some("name=first&name=second")),
            "first"
        );
        assert_eq!(display_name_from_query(Some("name")), "");
    }
}
