//! `QuizServer` builder and accept loop.
//!
//! This is the entry point for running a Quizroyale server. It ties
//! together all the layers: transport → client actor → hub → lobby.

use std::sync::Arc;
use std::time::Duration;

use quizroyale_game::GameConfig;
use quizroyale_lobby::{Hub, HubHandle};
use quizroyale_transport::{
    Handshake, Transport, WebSocketHandshake, WebSocketTransport,
};

use crate::{ClientActor, QuizError, ServerConfig};

/// Builder for configuring and starting a Quizroyale server.
///
/// # Example
///
/// ```rust,ignore
/// use quizroyale::prelude::*;
///
/// let server = QuizServer::builder()
///     .config(ServerConfig::load("quizroyale.json")?)
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct QuizServerBuilder {
    config: ServerConfig,
}

impl QuizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration. Call before [`bind`](Self::bind)
    /// to override the configured address.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_address = addr.to_string();
        self
    }

    /// Validates the configuration, binds the listener and starts the
    /// hub.
    pub async fn build(self) -> Result<QuizServer, QuizError> {
        self.config.validate()?;

        let transport =
            WebSocketTransport::bind(&self.config.bind_address).await?;
        let hub = Hub::spawn(
            self.config.lobby.clone(),
            self.config.intake_queue_size(),
        )?;

        Ok(QuizServer {
            transport,
            hub,
            handshake_timeout: self.config.handshake_timeout(),
            game: Arc::new(self.config.game),
        })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Quizroyale server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizServer {
    transport: WebSocketTransport,
    hub: HubHandle,
    handshake_timeout: Duration,
    game: Arc<GameConfig>,
}

impl QuizServer {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The hub new connections are queued into.
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a task for each that
    /// finishes the upgrade and then runs the client actor. A failed or
    /// stalled upgrade only loses that connection. Runs until the process
    /// is terminated.
    pub async fn run(mut self) -> Result<(), QuizError> {
        tracing::info!("Quizroyale server running");

        loop {
            match self.transport.accept().await {
                Ok(handshake) => {
                    tokio::spawn(serve(
                        handshake,
                        self.handshake_timeout,
                        Arc::clone(&self.game),
                        self.hub.clone(),
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

async fn serve(
    handshake: WebSocketHandshake,
    timeout: Duration,
    game: Arc<GameConfig>,
    hub: HubHandle,
) {
    let addr = handshake.peer_addr();
    match tokio::time::timeout(timeout, handshake.complete()).await {
        Ok(Ok(conn)) => ClientActor::new(conn, game).run(hub).await,
        Ok(Err(e)) => {
            tracing::debug!(%addr, error = %e, "upgrade failed");
        }
        Err(_) => {
            tracing::debug!(%addr, "upgrade timed out");
        }
    }
}
