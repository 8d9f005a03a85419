//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};

use crate::{
    Connection, ConnectionId, Handshake, Transport, TransportError,
    display_name_from_query,
};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
///
/// Every path is accepted as the upgrade endpoint; the `name` query
/// parameter of the upgrade request becomes the connection's display name.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            TransportError::Bind {
                addr: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Handshake = WebSocketHandshake;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Handshake, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;
        tracing::trace!(%addr, "accepted TCP connection");
        Ok(WebSocketHandshake { stream, addr })
    }

    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

/// A TCP connection waiting for its WebSocket upgrade request.
pub struct WebSocketHandshake {
    stream: TcpStream,
    addr: SocketAddr,
}

impl Handshake for WebSocketHandshake {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn complete(self) -> Result<Self::Connection, Self::Error> {
        let addr = self.addr;
        let mut name = String::new();
        let ws = tokio_tungstenite::accept_hdr_async(
            self.stream,
            |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                name = display_name_from_query(req.uri().query());
                Ok(resp)
            },
        )
        .await
        .map_err(|e| TransportError::Upgrade(e.into()))?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, %name, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            name,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            peer_closed: AtomicBool::new(false),
        })
    }

    fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// A single WebSocket connection.
///
/// The socket is split so that the writer and the reader never wait on
/// each other's lock.
pub struct WebSocketConnection {
    id: ConnectionId,
    name: String,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    /// Set once the peer's close frame (or end of stream) was observed.
    peer_closed: AtomicBool,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(write_error)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.peer_closed.store(true, Ordering::Release);
                    return Ok(None);
                }
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    self.peer_closed.store(true, Ordering::Release);
                    return Err(TransportError::ReceiveFailed(e.into()));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if self.peer_closed.load(Ordering::Acquire) {
            return Ok(());
        }
        self.sink.lock().await.close().await.map_err(write_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// A write to a socket the peer already closed is a disconnect, not a
/// failure.
fn write_error(e: WsError) -> TransportError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            TransportError::ConnectionClosed(e.to_string())
        }
        other => TransportError::SendFailed(other.into()),
    }
}
