//! UpdateUserType (0x0f) — Server → Client.
//!
//! Toggles the client's operator status.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateUserType {
    /// `0x64` for operators, `0x00` otherwise.
    pub user_type: u8,
}

impl ClassicPacket for UpdateUserType {
    const ID: u8 = super::id::UPDATE_USER_TYPE;
    const PAYLOAD_LEN: usize = 1;
}

impl ProtoEncode for UpdateUserType {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.user_type);
    }
}

impl ProtoDecode for UpdateUserType {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        Ok(Self {
            user_type: buf.get_u8(),
        })
    }
}
