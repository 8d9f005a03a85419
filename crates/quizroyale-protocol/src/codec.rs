//! Frame encoding and decoding.
//!
//! The [`Wire`] trait is implemented for both message directions so the
//! server and test clients share one codec. Decoding checks every read
//! against the bytes actually present before touching the buffer; the
//! `bytes` getters would otherwise panic on a short frame.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::types::{
    ClientMessage, MAX_EFFECTS, MAX_NAME_LEN, MAX_PLAYERS, MAX_QUESTION_LEN,
    PlayerEntry, PlayerId, ServerMessage, StatusEffectId,
};
use crate::ProtocolError;

/// A message that can be turned into a single frame and back.
pub trait Wire: Sized {
    /// Encodes the message into one frame.
    ///
    /// # Errors
    /// [`ProtocolError::FieldTooLarge`] when a string or list exceeds its
    /// length prefix. Callers drop the message; nothing reaches the peer.
    fn encode(&self) -> Result<Bytes, ProtocolError>;

    /// Decodes one complete frame. Bytes after the message are ignored.
    ///
    /// # Errors
    /// [`ProtocolError::MalformedMessage`] for short or overrunning frames
    /// and [`ProtocolError::UnknownOpcode`] for an unrecognised first byte.
    fn decode(frame: &[u8]) -> Result<Self, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

impl Wire for ClientMessage {
    fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(8);
        buf.put_u8(self.opcode());
        match self {
            Self::Register { name } => put_name(&mut buf, name)?,
            Self::Submission { answer } => buf.put_i32(*answer),
            Self::PowerupPurchase {
                powerup_id,
                affected_player,
            } => {
                buf.put_u8(*powerup_id);
                buf.put_u8(*affected_player);
            }
            Self::SkipWait => {}
        }
        Ok(buf.freeze())
    }

    fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let mut buf = frame;
        let opcode = take_opcode(&mut buf)?;
        match opcode {
            Self::REGISTER => Ok(Self::Register {
                name: take_name(&mut buf, "register")?,
            }),
            Self::SUBMISSION => {
                need(&buf, 4, "submission")?;
                Ok(Self::Submission {
                    answer: buf.get_i32(),
                })
            }
            Self::POWERUP_PURCHASE => {
                need(&buf, 2, "powerup purchase")?;
                Ok(Self::PowerupPurchase {
                    powerup_id: buf.get_u8(),
                    affected_player: buf.get_u8(),
                })
            }
            Self::SKIP_WAIT => Ok(Self::SkipWait),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

impl Wire for ServerMessage {
    fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(16);
        buf.put_u8(self.opcode());
        match self {
            Self::HubGreeting | Self::StartGame => {}
            Self::LobbyGreeting { players } => {
                check_len("players", players.len(), MAX_PLAYERS)?;
                buf.put_u8(players.len() as u8);
                for player in players {
                    put_player(&mut buf, player)?;
                }
            }
            Self::NewRegisteredPlayer { player } => {
                put_player(&mut buf, player)?
            }
            Self::CorrectSubmission {
                new_score,
                new_coins,
            } => {
                buf.put_u32(*new_score);
                buf.put_u32(*new_coins);
            }
            Self::NewQuestion {
                difficulty,
                question,
            } => {
                check_len("question", question.len(), MAX_QUESTION_LEN)?;
                buf.put_u8(*difficulty);
                buf.put_u16(question.len() as u16);
                buf.put_slice(question.as_bytes());
            }
            Self::PurchaseConfirmed { new_coins } => buf.put_u32(*new_coins),
            Self::StatusChanged { effect_ids } => {
                put_effects(&mut buf, effect_ids)?
            }
            Self::OtherPlayerStatusChanged {
                player_id,
                effect_ids,
            } => {
                buf.put_u8(player_id.0);
                put_effects(&mut buf, effect_ids)?;
            }
            Self::Eliminated { place } => buf.put_u8(*place),
            Self::OpponentScoreChanged {
                player_id,
                new_score,
            } => {
                buf.put_u8(player_id.0);
                buf.put_u32(*new_score);
            }
            Self::OpponentEliminated { player_id } => buf.put_u8(player_id.0),
        }
        Ok(buf.freeze())
    }

    fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let mut buf = frame;
        let opcode = take_opcode(&mut buf)?;
        match opcode {
            Self::HUB_GREETING => Ok(Self::HubGreeting),
            Self::LOBBY_GREETING => {
                need(&buf, 1, "lobby greeting")?;
                let count = buf.get_u8() as usize;
                let mut players = Vec::with_capacity(count);
                for _ in 0..count {
                    players.push(take_player(&mut buf)?);
                }
                Ok(Self::LobbyGreeting { players })
            }
            Self::NEW_REGISTERED_PLAYER => Ok(Self::NewRegisteredPlayer {
                player: take_player(&mut buf)?,
            }),
            Self::CORRECT_SUBMISSION => {
                need(&buf, 8, "correct submission")?;
                Ok(Self::CorrectSubmission {
                    new_score: buf.get_u32(),
                    new_coins: buf.get_u32(),
                })
            }
            Self::NEW_QUESTION => {
                need(&buf, 3, "new question")?;
                let difficulty = buf.get_u8();
                let len = buf.get_u16() as usize;
                let question = take_text(&mut buf, len, "question")?;
                Ok(Self::NewQuestion {
                    difficulty,
                    question,
                })
            }
            Self::PURCHASE_CONFIRMED => {
                need(&buf, 4, "purchase confirmed")?;
                Ok(Self::PurchaseConfirmed {
                    new_coins: buf.get_u32(),
                })
            }
            Self::STATUS_CHANGED => Ok(Self::StatusChanged {
                effect_ids: take_effects(&mut buf)?,
            }),
            Self::OTHER_PLAYER_STATUS_CHANGED => {
                need(&buf, 1, "other player status")?;
                let player_id = PlayerId(buf.get_u8());
                Ok(Self::OtherPlayerStatusChanged {
                    player_id,
                    effect_ids: take_effects(&mut buf)?,
                })
            }
            Self::ELIMINATED => {
                need(&buf, 1, "eliminated")?;
                Ok(Self::Eliminated {
                    place: buf.get_u8(),
                })
            }
            Self::START_GAME => Ok(Self::StartGame),
            Self::OPPONENT_SCORE_CHANGED => {
                need(&buf, 5, "opponent score")?;
                Ok(Self::OpponentScoreChanged {
                    player_id: PlayerId(buf.get_u8()),
                    new_score: buf.get_u32(),
                })
            }
            Self::OPPONENT_ELIMINATED => {
                need(&buf, 1, "opponent eliminated")?;
                Ok(Self::OpponentEliminated {
                    player_id: PlayerId(buf.get_u8()),
                })
            }
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn check_len(
    field: &'static str,
    len: usize,
    max: usize,
) -> Result<(), ProtocolError> {
    if len > max {
        return Err(ProtocolError::FieldTooLarge { field, len, max });
    }
    Ok(())
}

fn put_name(buf: &mut BytesMut, name: &str) -> Result<(), ProtocolError> {
    check_len("name", name.len(), MAX_NAME_LEN)?;
    buf.put_u8(name.len() as u8);
    buf.put_slice(name.as_bytes());
    Ok(())
}

fn put_player(
    buf: &mut BytesMut,
    player: &PlayerEntry,
) -> Result<(), ProtocolError> {
    buf.put_u8(player.id.0);
    put_name(buf, &player.name)
}

fn put_effects(
    buf: &mut BytesMut,
    effect_ids: &[StatusEffectId],
) -> Result<(), ProtocolError> {
    check_len("status effects", effect_ids.len(), MAX_EFFECTS)?;
    buf.put_u16(effect_ids.len() as u16);
    for id in effect_ids {
        buf.put_u16(*id);
    }
    Ok(())
}

fn need(buf: &&[u8], len: usize, what: &str) -> Result<(), ProtocolError> {
    if buf.remaining() < len {
        return Err(ProtocolError::MalformedMessage(format!(
            "{what}: needs {len} more bytes, {} left",
            buf.remaining()
        )));
    }
    Ok(())
}

fn take_opcode(buf: &mut &[u8]) -> Result<u8, ProtocolError> {
    need(buf, 1, "frame")?;
    Ok(buf.get_u8())
}

fn take_text(
    buf: &mut &[u8],
    len: usize,
    what: &str,
) -> Result<String, ProtocolError> {
    need(buf, len, what)?;
    let text = std::str::from_utf8(&buf[..len])
        .map_err(|e| {
            ProtocolError::MalformedMessage(format!("{what}: {e}"))
        })?
        .to_owned();
    buf.advance(len);
    Ok(text)
}

fn take_name(buf: &mut &[u8], what: &str) -> Result<String, ProtocolError> {
    need(buf, 1, what)?;
    let len = buf.get_u8() as usize;
    take_text(buf, len, what)
}

fn take_player(buf: &mut &[u8]) -> Result<PlayerEntry, ProtocolError> {
    need(buf, 2, "player")?;
    let id = PlayerId(buf.get_u8());
    let name = take_name(buf, "player name")?;
    Ok(PlayerEntry { id, name })
}

fn take_effects(
    buf: &mut &[u8],
) -> Result<Vec<StatusEffectId>, ProtocolError> {
    need(buf, 2, "status effects")?;
    let count = buf.get_u16() as usize;
    need(buf, count * 2, "status effects")?;
    Ok((0..count).map(|_| buf.get_u16()).collect())
}
