//! Lobby actor: an isolated Tokio task that runs one game.
//!
//! The actor owns the phase transitions and every cross-player effect.
//! Client actors and the elimination timer talk to it through one event
//! channel, so all game-state changes that involve more than one player
//! are applied in a single order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quizroyale_game::Powerup;
use quizroyale_protocol::PlayerId;
use quizroyale_tick::TickScheduler;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time;

use crate::roster::Roster;
use crate::{LobbyConfig, LobbyError, LobbyPhase, PendingClient, Seat};

/// Identifies a lobby for the lifetime of the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

/// A snapshot of lobby metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyInfo {
    pub lobby_id: LobbyId,
    pub phase: LobbyPhase,
    /// Players ever registered, including those who left or were
    /// eliminated.
    pub members: usize,
    /// Players still in the game.
    pub active: usize,
    pub capacity: usize,
}

impl LobbyInfo {
    /// Whether the hub may place another player here.
    pub fn has_space(&self) -> bool {
        self.phase.is_joinable() && self.members < self.capacity
    }
}

/// Everything a lobby reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    /// A player answered correctly; `score` is its new total.
    Progress { player_id: PlayerId, score: u32 },

    /// A player bought an opponent-targeted power-up. `target` is the raw
    /// id from the purchase and may not name a valid opponent.
    StatusEffect {
        source: PlayerId,
        target: u8,
        powerup: Powerup,
    },

    /// An affliction on `player_id` wore off.
    EffectExpired { player_id: PlayerId, powerup: Powerup },

    /// A vote to end the waiting phase early.
    SkipWait(PlayerId),

    /// A new display name, sent while waiting.
    Rename { player_id: PlayerId, name: String },

    /// A player was registered.
    Joined(PlayerId),

    /// A player was unregistered.
    Departed(PlayerId),

    /// Time for an elimination round.
    EliminationTick,

    /// Close the lobby now.
    Shutdown,
}

/// A registration the lobby refused. The pending client is handed back
/// so the caller can try another lobby.
#[derive(Debug)]
pub struct Rejected {
    pub error: LobbyError,
    pub pending: PendingClient,
}

/// Handle to a running lobby. Cheap to clone.
///
/// Registration and unregistration go straight to the lock-protected
/// roster; everything else is an event for the lobby's own task.
#[derive(Clone)]
pub struct LobbyHandle {
    lobby_id: LobbyId,
    roster: Arc<Mutex<Roster>>,
    events: mpsc::UnboundedSender<LobbyEvent>,
}

impl LobbyHandle {
    pub fn lobby_id(&self) -> LobbyId {
        self.lobby_id
    }

    /// Seats a pending client. On success the client's [`Seat`] has been
    /// delivered and the lobby notified.
    pub async fn register(
        &self,
        pending: PendingClient,
    ) -> Result<PlayerId, Rejected> {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let player_id = {
            let mut roster = self.roster.lock().await;
            match roster.register(
                &pending.name,
                pending.outbound.clone(),
                commands_tx,
            ) {
                Ok(id) => id,
                Err(error) => return Err(Rejected { error, pending }),
            }
        };

        tracing::info!(
            lobby_id = %self.lobby_id,
            %player_id,
            name = %pending.name,
            "player registered"
        );

        let seat = Seat {
            player_id,
            lobby: self.clone(),
            commands,
        };
        if pending.seat.send(seat).is_err() {
            tracing::debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "client gone before it was seated"
            );
            self.unregister(player_id).await;
            return Ok(player_id);
        }
        let _ = self.events.send(LobbyEvent::Joined(player_id));
        Ok(player_id)
    }

    /// Removes a player. Safe to call more than once: only the first call
    /// for an active player changes counts or notifies anyone, and only
    /// that call returns `true`.
    pub async fn unregister(&self, player_id: PlayerId) -> bool {
        let departed = self.roster.lock().await.unregister(player_id);
        if departed {
            tracing::info!(
                lobby_id = %self.lobby_id,
                %player_id,
                "player left"
            );
            let _ = self.events.send(LobbyEvent::Departed(player_id));
        }
        departed
    }

    /// Hands an event to the lobby's task.
    pub fn report(&self, event: LobbyEvent) -> Result<(), LobbyError> {
        self.events
            .send(event)
            .map_err(|_| LobbyError::Closed(self.lobby_id))
    }

    pub async fn info(&self) -> LobbyInfo {
        self.roster.lock().await.info()
    }

    /// Tells the lobby to close.
    pub fn shutdown(&self) {
        let _ = self.events.send(LobbyEvent::Shutdown);
    }

    /// Whether the lobby's task has stopped.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

impl fmt::Debug for LobbyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LobbyHandle")
            .field("lobby_id", &self.lobby_id)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

enum Flow {
    Continue,
    Start,
    Close,
}

struct Lobby {
    lobby_id: LobbyId,
    config: LobbyConfig,
    roster: Arc<Mutex<Roster>>,
    events: mpsc::UnboundedReceiver<LobbyEvent>,
    /// Handed to the elimination timer task.
    ticker_tx: mpsc::UnboundedSender<LobbyEvent>,
    ticker: Option<JoinHandle<()>>,
    closed: mpsc::UnboundedSender<LobbyId>,
}

impl Lobby {
    async fn run(mut self) {
        tracing::info!(
            lobby_id = %self.lobby_id,
            capacity = self.config.capacity,
            "lobby opened"
        );

        if self.wait_for_players().await && self.start().await {
            self.play().await;
        }
        self.close().await;
    }

    /// Runs the waiting phase. Returns `true` when the game should start.
    async fn wait_for_players(&mut self) -> bool {
        let deadline = time::sleep(self.config.waiting_period());
        tokio::pin!(deadline);

        loop {
            let flow = tokio::select! {
                () = &mut deadline => {
                    tracing::debug!(lobby_id = %self.lobby_id, "waiting period over");
                    Flow::Start
                }
                event = self.events.recv() => match event {
                    Some(event) => self.on_waiting_event(event).await,
                    None => Flow::Close,
                },
            };
            match flow {
                Flow::Continue => {}
                Flow::Start => return true,
                Flow::Close => return false,
            }
        }
    }

    async fn on_waiting_event(&mut self, event: LobbyEvent) -> Flow {
        let mut roster = self.roster.lock().await;
        match event {
            LobbyEvent::Joined(_) => {
                if self.config.start_when_full && roster.is_full() {
                    tracing::info!(lobby_id = %self.lobby_id, "lobby full");
                    return Flow::Start;
                }
            }
            LobbyEvent::Departed(_) => {
                if roster.close_if_empty() {
                    return Flow::Close;
                }
                if self.config.allow_skip_wait && roster.skip_vote_passed() {
                    return Flow::Start;
                }
            }
            LobbyEvent::SkipWait(player_id) => {
                if self.config.allow_skip_wait && roster.vote_skip(player_id) {
                    tracing::info!(lobby_id = %self.lobby_id, "skip vote passed");
                    return Flow::Start;
                }
            }
            LobbyEvent::Rename { player_id, name } => {
                roster.rename(player_id, &name);
            }
            LobbyEvent::Shutdown => return Flow::Close,
            other => {
                tracing::debug!(
                    lobby_id = %self.lobby_id,
                    event = ?other,
                    "event ignored while waiting"
                );
            }
        }
        Flow::Continue
    }

    /// Starts the game. Returns `false` if nobody is left to play.
    async fn start(&mut self) -> bool {
        let started = self.roster.lock().await.begin();
        if started == 0 {
            return false;
        }
        tracing::info!(
            lobby_id = %self.lobby_id,
            players = started,
            "game started"
        );
        self.ticker = Some(spawn_elimination_timer(
            self.lobby_id,
            self.config.elimination_interval(),
            self.ticker_tx.clone(),
        ));
        true
    }

    async fn play(&mut self) {
        while let Some(event) = self.events.recv().await {
            let mut roster = self.roster.lock().await;
            match event {
                LobbyEvent::Progress { player_id, score } => {
                    roster.record_score(player_id, score);
                }
                LobbyEvent::StatusEffect {
                    source,
                    target,
                    powerup,
                } => match roster.afflict(source, PlayerId(target), powerup) {
                    Ok(()) => tracing::debug!(
                        lobby_id = %self.lobby_id,
                        %source,
                        target_id = target,
                        %powerup,
                        "power-up applied"
                    ),
                    Err(e) => tracing::warn!(
                        lobby_id = %self.lobby_id,
                        %source,
                        %powerup,
                        error = %e,
                        "power-up target rejected"
                    ),
                },
                LobbyEvent::EffectExpired { player_id, powerup } => {
                    roster.expire(player_id, powerup);
                }
                LobbyEvent::EliminationTick => {
                    for (player_id, place) in
                        roster.eliminate_round(self.config.eliminations_per_tick)
                    {
                        tracing::info!(
                            lobby_id = %self.lobby_id,
                            %player_id,
                            place,
                            "player eliminated"
                        );
                    }
                }
                LobbyEvent::Departed(_) => {}
                LobbyEvent::Shutdown => {
                    tracing::info!(lobby_id = %self.lobby_id, "lobby shutting down");
                    return;
                }
                other @ (LobbyEvent::Joined(_)
                | LobbyEvent::SkipWait(_)
                | LobbyEvent::Rename { .. }) => {
                    tracing::debug!(
                        lobby_id = %self.lobby_id,
                        event = ?other,
                        "event ignored while active"
                    );
                }
            }
            if roster.close_if_empty() {
                return;
            }
        }
    }

    async fn close(mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        let phase = {
            let mut roster = self.roster.lock().await;
            roster.close();
            roster.phase()
        };
        let _ = self.closed.send(self.lobby_id);
        tracing::info!(lobby_id = %self.lobby_id, %phase, "lobby closed");
    }
}

/// Feeds `EliminationTick` into the lobby every `interval` until the
/// lobby stops listening.
fn spawn_elimination_timer(
    lobby_id: LobbyId,
    interval: Duration,
    events: mpsc::UnboundedSender<LobbyEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut scheduler = TickScheduler::every(interval);
        loop {
            let info = scheduler.wait_for_tick().await;
            tracing::trace!(
                %lobby_id,
                tick = info.tick,
                skipped = info.ticks_skipped,
                "elimination tick"
            );
            if events.send(LobbyEvent::EliminationTick).is_err() {
                break;
            }
        }
    })
}

/// Spawns a lobby task and returns a handle to it. `closed` receives the
/// lobby's id once it has shut down.
pub(crate) fn spawn_lobby(
    lobby_id: LobbyId,
    config: LobbyConfig,
    closed: mpsc::UnboundedSender<LobbyId>,
) -> LobbyHandle {
    let (events_tx, events) = mpsc::unbounded_channel();
    let roster = Arc::new(Mutex::new(Roster::new(lobby_id, config.capacity)));

    let lobby = Lobby {
        lobby_id,
        config,
        roster: Arc::clone(&roster),
        events,
        ticker_tx: events_tx.clone(),
        ticker: None,
        closed,
    };
    tokio::spawn(lobby.run());

    LobbyHandle {
        lobby_id,
        roster,
        events: events_tx,
    }
}
