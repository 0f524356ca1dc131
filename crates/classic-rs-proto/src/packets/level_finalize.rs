//! LevelFinalize (0x04) — Server → Client.
//!
//! Ends the world transfer and tells the client the map dimensions.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFinalize {
    pub x_size: u16,
    pub y_size: u16,
    pub z_size: u16,
}

impl ClassicPacket for LevelFinalize {
    const ID: u8 = super::id::LEVEL_FINALIZE;
    const PAYLOAD_LEN: usize = 6;
}

impl ProtoEncode for LevelFinalize {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u16(self.x_size);
        buf.put_u16(self.y_size);
        buf.put_u16(self.z_size);
    }
}

impl ProtoDecode for LevelFinalize {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        Ok(Self {
            x_size: buf.get_u16(),
            y_size: buf.get_u16(),
            z_size: buf.get_u16(),
        })
    }
}
