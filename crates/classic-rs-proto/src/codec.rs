//! Protocol encoding/decoding traits and helpers.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;

/// Length of every string field on the wire.
pub const STRING_LENGTH: usize = 64;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// A packet with a fixed opcode and a fixed payload size.
pub trait ClassicPacket: ProtoEncode + ProtoDecode {
    const ID: u8;
    const PAYLOAD_LEN: usize;
}

/// Fail with `BufferTooShort` unless `needed` bytes remain.
pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Write a classic string: exactly 64 bytes, space padded, truncated if longer.
///
/// Characters outside printable ASCII are written as `?`.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    let mut written = 0;
    for c in s.chars().take(STRING_LENGTH) {
        let byte = if c.is_ascii() && !c.is_ascii_control() {
            c as u8
        } else {
            b'?'
        };
        buf.put_u8(byte);
        written += 1;
    }
    buf.put_bytes(b' ', STRING_LENGTH - written);
}

/// Read a classic string, stripping the trailing space padding.
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    ensure_remaining(buf, STRING_LENGTH)?;
    let mut raw = [0u8; STRING_LENGTH];
    buf.copy_to_slice(&mut raw);
    let end = raw
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |last| last + 1);
    Ok(raw[..end]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect())
}
