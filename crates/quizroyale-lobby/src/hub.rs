//! Hub: the process-wide matchmaking registry.
//!
//! Runs as a single task that owns the pool of lobby handles. New clients
//! arrive through a bounded intake queue; lobbies report their own closure
//! on a separate channel so the hub can drop them from the pool.

use tokio::sync::{mpsc, oneshot};

use crate::lobby::spawn_lobby;
use crate::{LobbyConfig, LobbyError, LobbyHandle, LobbyId, LobbyInfo, PendingClient};

enum HubRequest {
    Place(PendingClient),
    Lobbies(oneshot::Sender<Vec<LobbyInfo>>),
}

/// Handle to the running hub. Cheap to clone.
#[derive(Clone)]
pub struct HubHandle {
    requests: mpsc::Sender<HubRequest>,
}

impl HubHandle {
    /// Queues a client for placement. Waits while the intake queue is
    /// full.
    pub async fn enqueue(&self, pending: PendingClient) -> Result<(), LobbyError> {
        self.requests
            .send(HubRequest::Place(pending))
            .await
            .map_err(|_| LobbyError::Abandoned)
    }

    /// Snapshots every lobby in the pool, oldest first.
    pub async fn lobbies(&self) -> Result<Vec<LobbyInfo>, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(HubRequest::Lobbies(reply_tx))
            .await
            .map_err(|_| LobbyError::Abandoned)?;
        reply_rx.await.map_err(|_| LobbyError::Abandoned)
    }
}

/// The matchmaking registry.
pub struct Hub {
    config: LobbyConfig,
    lobbies: Vec<LobbyHandle>,
    next_lobby_id: u64,
    requests: mpsc::Receiver<HubRequest>,
    closed_tx: mpsc::UnboundedSender<LobbyId>,
    closed_rx: mpsc::UnboundedReceiver<LobbyId>,
}

impl Hub {
    /// Validates `config`, spawns the hub task and returns a handle to it.
    ///
    /// `intake_queue_size` bounds how many clients may wait for placement
    /// at once. The hub stops, shutting down its lobbies, once every
    /// handle has been dropped.
    pub fn spawn(
        config: LobbyConfig,
        intake_queue_size: usize,
    ) -> Result<HubHandle, LobbyError> {
        config.validate()?;
        let (requests_tx, requests) = mpsc::channel(intake_queue_size.max(1));
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();

        let hub = Self {
            config,
            lobbies: Vec::new(),
            next_lobby_id: 0,
            requests,
            closed_tx,
            closed_rx,
        };
        tokio::spawn(hub.run());

        Ok(HubHandle {
            requests: requests_tx,
        })
    }

    async fn run(mut self) {
        tracing::info!(capacity = self.config.capacity, "hub started");

        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(HubRequest::Place(pending)) => self.place(pending).await,
                    Some(HubRequest::Lobbies(reply)) => {
                        let _ = reply.send(self.snapshot().await);
                    }
                    None => break,
                },
                Some(lobby_id) = self.closed_rx.recv() => self.remove(lobby_id),
            }
        }

        for lobby in &self.lobbies {
            lobby.shutdown();
        }
        tracing::info!(lobbies = self.lobbies.len(), "hub stopped");
    }

    /// Seats a client in the fullest lobby with space, opening a new
    /// lobby when none has any. A lobby that fills or starts between the
    /// snapshot and the registration just means trying the next one.
    async fn place(&mut self, mut pending: PendingClient) {
        let infos = self.snapshot().await;
        for index in placement_order(&infos) {
            let lobby = &self.lobbies[index];
            match lobby.register(pending).await {
                Ok(_) => return,
                Err(rejected) => {
                    tracing::debug!(
                        lobby_id = %lobby.lobby_id(),
                        error = %rejected.error,
                        "placement lost a race, trying next lobby"
                    );
                    pending = rejected.pending;
                }
            }
        }

        let lobby = self.open_lobby();
        if let Err(rejected) = lobby.register(pending).await {
            tracing::warn!(
                lobby_id = %lobby.lobby_id(),
                error = %rejected.error,
                name = %rejected.pending.name(),
                "fresh lobby refused client, dropping it"
            );
        }
    }

    fn open_lobby(&mut self) -> LobbyHandle {
        self.next_lobby_id += 1;
        let lobby_id = LobbyId(self.next_lobby_id);
        let handle =
            spawn_lobby(lobby_id, self.config.clone(), self.closed_tx.clone());
        self.lobbies.push(handle.clone());
        tracing::info!(
            %lobby_id,
            lobbies = self.lobbies.len(),
            "lobby created"
        );
        handle
    }

    fn remove(&mut self, lobby_id: LobbyId) {
        if let Some(index) =
            self.lobbies.iter().position(|l| l.lobby_id() == lobby_id)
        {
            self.lobbies.swap_remove(index);
            tracing::info!(
                %lobby_id,
                lobbies = self.lobbies.len(),
                "lobby removed"
            );
        }
    }

    async fn snapshot(&self) -> Vec<LobbyInfo> {
        let mut infos = Vec::with_capacity(self.lobbies.len());
        for lobby in &self.lobbies {
            infos.push(lobby.info().await);
        }
        infos
    }
}

/// Indices of the lobbies that can take a player, fullest first. Equal
/// fill keeps pool order.
pub fn placement_order(infos: &[LobbyInfo]) -> Vec<usize> {
    let mut order: Vec<usize> = infos
        .iter()
        .enumerate()
        .filter(|(_, info)| info.has_space())
        .map(|(index, _)| index)
        .collect();
    order.sort_by(|a, b| infos[*b].members.cmp(&infos[*a].members));
    order
}
