//! The lobby's membership table.
//!
//! The roster is the one piece of lobby state touched from outside the
//! lobby's own task: the hub registers players into it and disconnecting
//! client actors unregister themselves. It therefore sits behind a lock,
//! and every method that changes membership also sends the resulting
//! notifications while that lock is held, so no other task observes a
//! half-applied change.

use std::collections::BTreeMap;

use quizroyale_game::Powerup;
use quizroyale_protocol::{
    MAX_NAME_LEN, PlayerEntry, PlayerId, ServerMessage, StatusEffectId,
};

use crate::{
    ClientCommand, CommandSender, LobbyError, LobbyId, LobbyInfo, LobbyPhase,
    OutboundSender,
};

/// Where a member stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    /// Still in the game (or waiting for it to start).
    Active,
    /// Out of the game; `place` is its final standing.
    Eliminated { place: u8 },
    /// Left before being eliminated.
    Disconnected,
}

pub(crate) struct Member {
    name: String,
    status: MemberStatus,
    score: u32,
    effects: Vec<Powerup>,
    skip_vote: bool,
    outbound: Option<OutboundSender>,
    commands: Option<CommandSender>,
}

impl Member {
    fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// Who a broadcast goes to.
#[derive(Debug, Clone, Copy)]
enum Audience {
    /// Every active member.
    Contenders,
    /// Every active member except one.
    ContendersExcept(PlayerId),
    /// Everyone still connected except one, eliminated members included.
    EveryoneExcept(PlayerId),
}

pub(crate) struct Roster {
    lobby_id: LobbyId,
    capacity: usize,
    phase: LobbyPhase,
    /// One entry per player ever registered; entries outlive elimination
    /// and disconnection. Ordered by id, so broadcasts and tie-breaks are
    /// deterministic.
    members: BTreeMap<PlayerId, Member>,
    active: usize,
}

impl Roster {
    pub(crate) fn new(lobby_id: LobbyId, capacity: usize) -> Self {
        Self {
            lobby_id,
            capacity,
            phase: LobbyPhase::Waiting,
            members: BTreeMap::new(),
            active: 0,
        }
    }

    pub(crate) fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active
    }

    pub(crate) fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub(crate) fn status(&self, player_id: PlayerId) -> Option<MemberStatus> {
        self.members.get(&player_id).map(|m| m.status)
    }

    pub(crate) fn info(&self) -> LobbyInfo {
        LobbyInfo {
            lobby_id: self.lobby_id,
            phase: self.phase,
            members: self.members.len(),
            active: self.active,
            capacity: self.capacity,
        }
    }

    // -- membership -------------------------------------------------------

    pub(crate) fn check_joinable(&self) -> Result<(), LobbyError> {
        if !self.phase.is_joinable() {
            return Err(LobbyError::NotJoinable(self.lobby_id, self.phase));
        }
        if self.is_full() {
            return Err(LobbyError::Full(self.lobby_id));
        }
        Ok(())
    }

    /// Adds a player: existing members hear about it, the newcomer gets
    /// the list of everyone still in.
    pub(crate) fn register(
        &mut self,
        name: &str,
        outbound: OutboundSender,
        commands: CommandSender,
    ) -> Result<PlayerId, LobbyError> {
        self.check_joinable()?;
        let player_id = u8::try_from(self.members.len())
            .map(PlayerId)
            .map_err(|_| LobbyError::Full(self.lobby_id))?;
        let name = clamp_name(name);

        self.broadcast(
            &ServerMessage::NewRegisteredPlayer {
                player: PlayerEntry {
                    id: player_id,
                    name: name.clone(),
                },
            },
            Audience::Contenders,
        );

        self.members.insert(
            player_id,
            Member {
                name,
                status: MemberStatus::Active,
                score: 0,
                effects: Vec::new(),
                skip_vote: false,
                outbound: Some(outbound),
                commands: Some(commands),
            },
        );
        self.active += 1;

        let players = self.contender_entries();
        self.send_to(player_id, ServerMessage::LobbyGreeting { players });
        Ok(player_id)
    }

    /// Removes a player's channels. Returns `true` only the first time an
    /// active player leaves; repeated calls, and calls for players already
    /// eliminated, change no counts and notify nobody.
    pub(crate) fn unregister(&mut self, player_id: PlayerId) -> bool {
        let Some(member) = self.members.get_mut(&player_id) else {
            return false;
        };
        member.outbound = None;
        member.commands = None;
        if !member.is_active() {
            return false;
        }
        member.status = MemberStatus::Disconnected;
        self.active -= 1;
        self.broadcast(
            &ServerMessage::OpponentEliminated { player_id },
            Audience::EveryoneExcept(player_id),
        );
        true
    }

    /// Changes a waiting player's display name and tells the others.
    pub(crate) fn rename(&mut self, player_id: PlayerId, name: &str) -> bool {
        if !self.phase.is_joinable() {
            return false;
        }
        let name = clamp_name(name);
        let Some(member) = self.members.get_mut(&player_id) else {
            return false;
        };
        if !member.is_active() {
            return false;
        }
        member.name = name.clone();
        self.broadcast(
            &ServerMessage::NewRegisteredPlayer {
                player: PlayerEntry {
                    id: player_id,
                    name,
                },
            },
            Audience::ContendersExcept(player_id),
        );
        true
    }

    /// Records a vote to skip the wait. Returns whether every active
    /// member has now voted.
    pub(crate) fn vote_skip(&mut self, player_id: PlayerId) -> bool {
        if let Some(member) = self.members.get_mut(&player_id) {
            if member.is_active() {
                member.skip_vote = true;
            }
        }
        self.skip_vote_passed()
    }

    pub(crate) fn skip_vote_passed(&self) -> bool {
        self.active > 0
            && self
                .members
                .values()
                .filter(|m| m.is_active())
                .all(|m| m.skip_vote)
    }

    // -- phase changes --------------------------------------------------------

    /// Moves to `Active` and starts every active member. Returns how many
    /// members were started.
    pub(crate) fn begin(&mut self) -> usize {
        if !self.transition(LobbyPhase::Active) {
            return 0;
        }
        let mut started = 0;
        for member in self.members.values().filter(|m| m.is_active()) {
            if let Some(outbound) = &member.outbound {
                let _ = outbound.send(ServerMessage::StartGame);
            }
            if let Some(commands) = &member.commands {
                let _ = commands.send(ClientCommand::StartGame);
            }
            started += 1;
        }
        started
    }

    /// Closes the lobby if nobody is left in it. Returns whether it is
    /// closed.
    pub(crate) fn close_if_empty(&mut self) -> bool {
        if self.active == 0 {
            self.transition(LobbyPhase::Closed);
        }
        self.phase == LobbyPhase::Closed
    }

    /// Closes the lobby and drops every member's channels, which ends
    /// their client actors.
    pub(crate) fn close(&mut self) {
        self.transition(LobbyPhase::Closed);
        for member in self.members.values_mut() {
            member.outbound = None;
            member.commands = None;
        }
    }

    fn transition(&mut self, target: LobbyPhase) -> bool {
        if !self.phase.can_transition_to(target) {
            return false;
        }
        tracing::debug!(
            lobby_id = %self.lobby_id,
            from = %self.phase,
            to = %target,
            "lobby phase change"
        );
        self.phase = target;
        true
    }

    // -- game events ------------------------------------------------------------

    /// Mirrors a member's score and tells the other contenders.
    pub(crate) fn record_score(&mut self, player_id: PlayerId, score: u32) {
        let Some(member) = self.members.get_mut(&player_id) else {
            return;
        };
        if !member.is_active() {
            return;
        }
        member.score = score;
        self.broadcast(
            &ServerMessage::OpponentScoreChanged {
                player_id,
                new_score: score,
            },
            Audience::ContendersExcept(player_id),
        );
    }

    /// Applies an opponent-targeted power-up bought by `source`.
    pub(crate) fn afflict(
        &mut self,
        source: PlayerId,
        target: PlayerId,
        powerup: Powerup,
    ) -> Result<(), LobbyError> {
        let member = self
            .members
            .get_mut(&target)
            .filter(|m| m.is_active() && target != source)
            .ok_or(LobbyError::UnknownPlayer(target, self.lobby_id))?;

        member.effects.push(powerup);
        if let Some(commands) = &member.commands {
            let _ = commands.send(ClientCommand::Afflict(powerup));
        }
        self.broadcast_status(target);
        Ok(())
    }

    /// Drops one instance of an expired effect from a member.
    pub(crate) fn expire(&mut self, player_id: PlayerId, powerup: Powerup) {
        let Some(member) = self.members.get_mut(&player_id) else {
            return;
        };
        let Some(pos) = member.effects.iter().position(|p| *p == powerup)
        else {
            return;
        };
        member.effects.remove(pos);
        self.broadcast_status(player_id);
    }

    // -- elimination ----------------------------------------------------------

    /// Runs one elimination round and returns who went out, with their
    /// places, in elimination order.
    ///
    /// With two or more contenders, the lowest scorers are eliminated but
    /// one always survives. A lone contender is the winner and is retired
    /// with place 1.
    pub(crate) fn eliminate_round(
        &mut self,
        per_tick: usize,
    ) -> Vec<(PlayerId, u8)> {
        let chosen = if self.active == 1 {
            self.members
                .iter()
                .filter(|(_, m)| m.is_active())
                .map(|(id, _)| *id)
                .collect()
        } else {
            select_for_elimination(self.contender_scores(), per_tick)
        };
        chosen
            .into_iter()
            .filter_map(|id| self.eliminate(id).map(|place| (id, place)))
            .collect()
    }

    /// Eliminates one active member. Its place is the number of active
    /// members at that moment, itself included.
    fn eliminate(&mut self, player_id: PlayerId) -> Option<u8> {
        let place = u8::try_from(self.active).unwrap_or(u8::MAX);
        let member = self.members.get_mut(&player_id)?;
        if !member.is_active() {
            return None;
        }
        member.status = MemberStatus::Eliminated { place };
        if let Some(outbound) = &member.outbound {
            let _ = outbound.send(ServerMessage::Eliminated { place });
        }
        if let Some(commands) = &member.commands {
            let _ = commands.send(ClientCommand::Retire);
        }
        self.active -= 1;
        self.broadcast(
            &ServerMessage::OpponentEliminated { player_id },
            Audience::EveryoneExcept(player_id),
        );
        Some(place)
    }

    fn contender_scores(&self) -> Vec<(u32, PlayerId)> {
        self.members
            .iter()
            .filter(|(_, m)| m.is_active())
            .map(|(id, m)| (m.score, *id))
            .collect()
    }

    // -- delivery ---------------------------------------------------------------

    fn contender_entries(&self) -> Vec<PlayerEntry> {
        self.members
            .iter()
            .filter(|(_, m)| m.is_active())
            .map(|(id, m)| PlayerEntry {
                id: *id,
                name: m.name.clone(),
            })
            .collect()
    }

    fn broadcast_status(&self, player_id: PlayerId) {
        let Some(member) = self.members.get(&player_id) else {
            return;
        };
        let effect_ids: Vec<StatusEffectId> = member
            .effects
            .iter()
            .map(|p| StatusEffectId::from(p.id()))
            .collect();
        self.broadcast(
            &ServerMessage::OtherPlayerStatusChanged {
                player_id,
                effect_ids: effect_ids.clone(),
            },
            Audience::ContendersExcept(player_id),
        );
        self.send_to(player_id, ServerMessage::StatusChanged { effect_ids });
    }

    /// Queues a message to one member. Silently drops it if the member
    /// has left.
    fn send_to(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(outbound) =
            self.members.get(&player_id).and_then(|m| m.outbound.as_ref())
        {
            let _ = outbound.send(msg);
        }
    }

    fn broadcast(&self, msg: &ServerMessage, audience: Audience) {
        for (id, member) in &self.members {
            let included = match audience {
                Audience::Contenders => member.is_active(),
                Audience::ContendersExcept(excluded) => {
                    member.is_active() && *id != excluded
                }
                Audience::EveryoneExcept(excluded) => *id != excluded,
            };
            if included {
                if let Some(outbound) = &member.outbound {
                    let _ = outbound.send(msg.clone());
                }
            }
        }
    }
}

/// Picks who goes out in one round: the `per_tick` lowest scores, ties
/// broken by the lower player id, never taking the last contender.
/// The result is in elimination order.
pub fn select_for_elimination(
    mut contenders: Vec<(u32, PlayerId)>,
    per_tick: usize,
) -> Vec<PlayerId> {
    let take = per_tick.min(contenders.len().saturating_sub(1));
    contenders.sort_unstable();
    contenders.into_iter().take(take).map(|(_, id)| id).collect()
}

/// Cuts a name to what fits the wire's one-byte length prefix, on a char
/// boundary.
fn clamp_name(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_owned();
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}
