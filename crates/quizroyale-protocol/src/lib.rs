//! Wire protocol for Quizroyale.
//!
//! Every frame is one complete application message: a leading opcode byte
//! followed by a fixed layout. Multi-byte integers are big-endian and all
//! length prefixes count bytes, not characters.
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`PlayerEntry`]):
//!   the closed set of messages in each direction.
//! - **Codec** ([`Wire`]): how those messages become frames and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → ClientActor / Lobby
//! ```

mod codec;
mod error;
mod types;

pub use codec::Wire;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, MAX_EFFECTS, MAX_NAME_LEN, MAX_PLAYERS, MAX_QUESTION_LEN,
    PlayerEntry, PlayerId, ServerMessage, StatusEffectId,
};
