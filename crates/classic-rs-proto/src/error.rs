//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("malformed field `{field}`: {value}")]
    MalformedField { field: &'static str, value: i64 },

    #[error("chunk too large: {0} bytes")]
    ChunkTooLarge(usize),
}
