//! Per-connection client actor.
//!
//! Each accepted connection gets a receive task (the actor itself) and a
//! send task. The flow is:
//!   1. Queue `HubGreeting` and hand a `PendingClient` to the hub
//!   2. Wait for a seat in a lobby, decoding and holding early frames
//!   3. Replay held frames, then loop over frames from the peer and
//!      commands from the lobby
//!   4. Unregister from the lobby; the send task drains and closes
//!
//! A malformed frame ends the connection whether or not the client has
//! been seated yet.

use std::sync::Arc;

use quizroyale_game::{
    GameConfig, PlayerState, Powerup, PowerupCatalog, QuestionGenerator,
    Submission,
};
use quizroyale_lobby::{
    ClientCommand, HubHandle, LobbyEvent, LobbyHandle, OutboundReceiver,
    OutboundSender, PendingClient, Seat,
};
use quizroyale_protocol::{ClientMessage, PlayerId, ServerMessage, Wire};
use quizroyale_transport::{Connection, ConnectionId};
use tokio::sync::{mpsc, oneshot};

/// Frames a client may send before it has a seat.
const MAX_EARLY_FRAMES: usize = 64;

/// Owns one connection and the player state behind it.
///
/// Only this actor writes its [`PlayerState`]. Opponents reach it through
/// the lobby, which relays their power-ups as [`ClientCommand`]s.
pub struct ClientActor<C: Connection> {
    conn: Arc<C>,
    state: PlayerState,
    questions: QuestionGenerator,
    game: Arc<GameConfig>,
    catalog: PowerupCatalog,
    outbound: OutboundSender,
}

/// Where the actor sits once the hub has placed it.
struct Seated {
    player_id: PlayerId,
    lobby: LobbyHandle,
}

enum Flow {
    Continue,
    Stop,
}

impl<C: Connection> ClientActor<C> {
    /// Creates the actor and spawns its send task.
    pub fn new(conn: C, game: Arc<GameConfig>) -> Self {
        Self::with_questions(conn, game, QuestionGenerator::from_os_rng())
    }

    /// Like [`new`](Self::new), with a caller-supplied question source.
    pub fn with_questions(
        conn: C,
        game: Arc<GameConfig>,
        questions: QuestionGenerator,
    ) -> Self {
        let conn = Arc::new(conn);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(send_loop(Arc::clone(&conn), outbound_rx));

        Self {
            conn,
            state: PlayerState::new(),
            questions,
            catalog: game.catalog(),
            game,
            outbound,
        }
    }

    fn conn_id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Runs the receive side until the peer leaves, breaks framing, or
    /// the lobby closes.
    pub async fn run(mut self, hub: HubHandle) {
        let conn_id = self.conn_id();
        self.send(ServerMessage::HubGreeting);

        let (pending, seat) =
            PendingClient::new(self.conn.display_name(), self.outbound.clone());
        if let Err(e) = hub.enqueue(pending).await {
            tracing::warn!(%conn_id, error = %e, "hub unavailable");
            return;
        }
        let Some((seat, early)) = self.await_seat(seat).await else {
            return;
        };

        let mut commands = seat.commands;
        let seated = Seated {
            player_id: seat.player_id,
            lobby: seat.lobby,
        };
        tracing::debug!(
            %conn_id,
            player_id = %seated.player_id,
            lobby_id = %seated.lobby.lobby_id(),
            "client seated"
        );

        for msg in early {
            self.on_message(msg, &seated);
        }

        loop {
            let flow = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        self.on_command(command, &seated);
                        Flow::Continue
                    }
                    None => {
                        tracing::debug!(%conn_id, "lobby closed");
                        Flow::Stop
                    }
                },
                frame = self.conn.recv() => match frame {
                    Ok(Some(data)) => self.on_frame(&data, &seated),
                    Ok(None) => {
                        tracing::debug!(%conn_id, "connection closed cleanly");
                        Flow::Stop
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        Flow::Stop
                    }
                },
            };
            if let Flow::Stop = flow {
                break;
            }
        }

        seated.lobby.unregister(seated.player_id).await;
        // Dropping `self` releases the last outbound sender; the send task
        // then drains the queue and closes the connection.
    }

    /// Waits for the hub to seat this client while still reading the
    /// socket, so a broken or departed peer is noticed before placement.
    /// Returns `None` when the actor should stop.
    async fn await_seat(
        &self,
        mut seat: oneshot::Receiver<Seat>,
    ) -> Option<(Seat, Vec<ClientMessage>)> {
        let conn_id = self.conn_id();
        let mut early = Vec::new();
        loop {
            tokio::select! {
                placed = &mut seat => match placed {
                    Ok(seat) => return Some((seat, early)),
                    Err(_) => {
                        tracing::warn!(%conn_id, "client was never seated");
                        return None;
                    }
                },
                frame = self.conn.recv() => match frame {
                    Ok(Some(data)) => match ClientMessage::decode(&data) {
                        Ok(_) if early.len() >= MAX_EARLY_FRAMES => {
                            tracing::debug!(
                                %conn_id,
                                "too many frames before seating, disconnecting"
                            );
                            return None;
                        }
                        Ok(msg) => early.push(msg),
                        Err(e) => {
                            tracing::debug!(
                                %conn_id,
                                error = %e,
                                "failed to decode frame, disconnecting"
                            );
                            return None;
                        }
                    },
                    Ok(None) => {
                        tracing::debug!(%conn_id, "closed before seating");
                        return None;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        return None;
                    }
                },
            }
        }
    }

    // -- lobby → actor ------------------------------------------------------

    fn on_command(&mut self, command: ClientCommand, seated: &Seated) {
        match command {
            ClientCommand::StartGame => {
                self.state.start();
                self.ask();
            }
            ClientCommand::Afflict(powerup) => {
                let affliction = self.state.afflict(powerup, &self.game);
                tracing::debug!(
                    player_id = %seated.player_id,
                    %powerup,
                    "afflicted"
                );
                if affliction.needs_question {
                    self.ask();
                }
            }
            ClientCommand::Retire => self.state.stop(),
        }
    }

    // -- peer → actor -------------------------------------------------------

    fn on_frame(&mut self, data: &[u8], seated: &Seated) -> Flow {
        let msg = match ClientMessage::decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    conn_id = %self.conn_id(),
                    player_id = %seated.player_id,
                    error = %e,
                    "failed to decode frame, disconnecting"
                );
                return Flow::Stop;
            }
        };
        self.on_message(msg, seated);
        Flow::Continue
    }

    fn on_message(&mut self, msg: ClientMessage, seated: &Seated) {
        match msg {
            ClientMessage::Register { name } => {
                report(seated, LobbyEvent::Rename {
                    player_id: seated.player_id,
                    name,
                });
            }
            ClientMessage::Submission { answer } => {
                self.on_submission(answer, seated);
            }
            ClientMessage::PowerupPurchase {
                powerup_id,
                affected_player,
            } => self.on_purchase(powerup_id, affected_player, seated),
            ClientMessage::SkipWait => {
                report(seated, LobbyEvent::SkipWait(seated.player_id));
            }
        }
    }

    fn on_submission(&mut self, answer: i32, seated: &Seated) {
        match self.state.submit(answer, &self.game) {
            Submission::Ignored => {}
            Submission::Absorbed => {
                expired(seated, Powerup::DoubleTap);
            }
            Submission::Correct(award) => {
                self.send(ServerMessage::CorrectSubmission {
                    new_score: award.score,
                    new_coins: award.coins,
                });
                report(seated, LobbyEvent::Progress {
                    player_id: seated.player_id,
                    score: award.score,
                });
                for _ in 0..award.hard_modes_cleared {
                    expired(seated, Powerup::HardMode);
                }
                if award.leveled_up {
                    tracing::debug!(
                        player_id = %seated.player_id,
                        difficulty = %award.difficulty,
                        "difficulty raised"
                    );
                }
                self.ask();
            }
        }
    }

    fn on_purchase(&mut self, powerup_id: u8, target: u8, seated: &Seated) {
        let purchase =
            match self.state.purchase(powerup_id, &self.catalog, &self.game) {
                Ok(purchase) => purchase,
                Err(e) => {
                    tracing::warn!(
                        player_id = %seated.player_id,
                        powerup_id,
                        error = %e,
                        "purchase ignored"
                    );
                    return;
                }
            };

        if purchase.powerup.targets_opponent() {
            report(seated, LobbyEvent::StatusEffect {
                source: seated.player_id,
                target,
                powerup: purchase.powerup,
            });
        }
        if purchase.needs_question {
            self.ask();
        }
        self.send(ServerMessage::PurchaseConfirmed {
            new_coins: purchase.new_coins,
        });
    }

    // -- outbound -------------------------------------------------------------

    fn ask(&mut self) {
        let question = self.state.ask(&mut self.questions);
        self.send(ServerMessage::NewQuestion {
            difficulty: self.state.difficulty().get(),
            question: question.text,
        });
    }

    fn send(&self, msg: ServerMessage) {
        // The send task only stops once the connection is gone.
        let _ = self.outbound.send(msg);
    }
}

fn report(seated: &Seated, event: LobbyEvent) {
    if let Err(e) = seated.lobby.report(event) {
        tracing::debug!(
            player_id = %seated.player_id,
            error = %e,
            "lobby event dropped"
        );
    }
}

fn expired(seated: &Seated, powerup: Powerup) {
    report(seated, LobbyEvent::EffectExpired {
        player_id: seated.player_id,
        powerup,
    });
}

/// Drains the outbound queue in order. A message that cannot be encoded
/// is dropped; a failed write ends the task. Closes the connection on the
/// way out.
async fn send_loop<C: Connection>(conn: Arc<C>, mut outbound: OutboundReceiver) {
    let conn_id = conn.id();
    while let Some(msg) = outbound.recv().await {
        let frame = match msg.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "dropping unencodable message");
                continue;
            }
        };
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "send failed");
            break;
        }
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
}
