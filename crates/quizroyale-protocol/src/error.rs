//! Error types for the protocol layer.
//!
//! Decoding errors describe a peer that broke framing and are fatal to
//! that connection. Encoding errors are local: the single offending
//! message is dropped and the connection stays open.

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is shorter than its opcode's fixed minimum, a declared
    /// length runs past the end of the frame, or a text field is not UTF-8.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The first byte matches no known opcode.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// A string or list does not fit its length prefix.
    #[error("{field} too large: {len} exceeds {max}")]
    FieldTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },
}
