//! Message types for Quizroyale's wire format.
//!
//! Each direction is a closed enum so that every dispatch over incoming
//! or outgoing traffic is an exhaustive `match`: adding an opcode is a
//! compile-checked change everywhere the messages are handled.

use std::fmt;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Longest display name, in bytes (one-byte length prefix).
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// Longest question text, in bytes (two-byte length prefix).
pub const MAX_QUESTION_LEN: usize = u16::MAX as usize;

/// Most players in a lobby greeting (one-byte count).
pub const MAX_PLAYERS: usize = u8::MAX as usize;

/// Most status effects in one status frame (two-byte count).
pub const MAX_EFFECTS: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A player's identifier, unique within one lobby.
///
/// Lobbies hand these out sequentially from zero and never reuse them, so
/// a single byte is enough for any lobby capacity the server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifier of a status effect shown on a player (a power-up id).
pub type StatusEffectId = u16;

/// A player as listed in greetings and join notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntry {
    pub id: PlayerId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Announce (or change) the display name while the lobby is waiting.
    Register { name: String },

    /// An answer to the outstanding question.
    Submission { answer: i32 },

    /// Buy a power-up. `affected_player` is only meaningful for power-ups
    /// aimed at an opponent.
    PowerupPurchase { powerup_id: u8, affected_player: u8 },

    /// Vote to end the waiting phase early.
    SkipWait,
}

impl ClientMessage {
    pub const REGISTER: u8 = 0;
    pub const SUBMISSION: u8 = 1;
    pub const POWERUP_PURCHASE: u8 = 2;
    pub const SKIP_WAIT: u8 = 3;

    /// The opcode byte that leads this message's frame.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Register { .. } => Self::REGISTER,
            Self::Submission { .. } => Self::SUBMISSION,
            Self::PowerupPurchase { .. } => Self::POWERUP_PURCHASE,
            Self::SkipWait => Self::SKIP_WAIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// First frame on every connection, before matchmaking.
    HubGreeting,

    /// Sent to a player once seated: every member not yet eliminated,
    /// including the player itself.
    LobbyGreeting { players: Vec<PlayerEntry> },

    /// Someone joined (or renamed themselves in) the lobby.
    NewRegisteredPlayer { player: PlayerEntry },

    /// The last submission was correct.
    CorrectSubmission { new_score: u32, new_coins: u32 },

    /// The next question to answer.
    NewQuestion { difficulty: u8, question: String },

    /// A power-up purchase went through.
    PurchaseConfirmed { new_coins: u32 },

    /// The recipient's own afflictions changed.
    StatusChanged { effect_ids: Vec<StatusEffectId> },

    /// Another player's afflictions changed.
    OtherPlayerStatusChanged {
        player_id: PlayerId,
        effect_ids: Vec<StatusEffectId>,
    },

    /// The recipient is out; `place` is its final standing (1 = winner).
    Eliminated { place: u8 },

    /// The waiting phase is over.
    StartGame,

    /// Another player's score moved.
    OpponentScoreChanged { player_id: PlayerId, new_score: u32 },

    /// Another player was eliminated or left.
    OpponentEliminated { player_id: PlayerId },
}

impl ServerMessage {
    pub const HUB_GREETING: u8 = 0;
    pub const LOBBY_GREETING: u8 = 1;
    pub const NEW_REGISTERED_PLAYER: u8 = 2;
    pub const CORRECT_SUBMISSION: u8 = 3;
    pub const NEW_QUESTION: u8 = 4;
    pub const PURCHASE_CONFIRMED: u8 = 5;
    pub const STATUS_CHANGED: u8 = 6;
    pub const OTHER_PLAYER_STATUS_CHANGED: u8 = 7;
    pub const ELIMINATED: u8 = 8;
    pub const START_GAME: u8 = 9;
    pub const OPPONENT_SCORE_CHANGED: u8 = 10;
    pub const OPPONENT_ELIMINATED: u8 = 11;

    /// The opcode byte that leads this message's frame.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::HubGreeting => Self::HUB_GREETING,
            Self::LobbyGreeting { .. } => Self::LOBBY_GREETING,
            Self::NewRegisteredPlayer { .. } => Self::NEW_REGISTERED_PLAYER,
            Self::CorrectSubmission { .. } => Self::CORRECT_SUBMISSION,
            Self::NewQuestion { .. } => Self::NEW_QUESTION,
            Self::PurchaseConfirmed { .. } => Self::PURCHASE_CONFIRMED,
            Self::StatusChanged { .. } => Self::STATUS_CHANGED,
            Self::OtherPlayerStatusChanged { .. } => {
                Self::OTHER_PLAYER_STATUS_CHANGED
            }
            Self::Eliminated { .. } => Self::ELIMINATED,
            Self::StartGame => Self::START_GAME,
            Self::OpponentScoreChanged { .. } => Self::OPPONENT_SCORE_CHANGED,
            Self::OpponentEliminated { .. } => Self::OPPONENT_ELIMINATED,
        }
    }
}
