//! PositionOrientation (0x08) — Bidirectional.
//!
//! Absolute player teleport/movement update.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOrientation {
    /// Always -1 from clients; the moving player's id from the server.
    pub player_id: i8,
    pub position: Position,
    pub yaw: u8,
    pub pitch: u8,
}

impl ClassicPacket for PositionOrientation {
    const ID: u8 = super::id::POSITION_ORIENTATION;
    const PAYLOAD_LEN: usize = 9;
}

impl ProtoEncode for PositionOrientation {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.player_id);
        self.position.proto_encode(buf);
        buf.put_u8(self.yaw);
        buf.put_u8(self.pitch);
    }
}

impl ProtoDecode for PositionOrientation {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        let player_id = buf.get_i8();
        let position = Position::proto_decode(buf)?;
        let yaw = buf.get_u8();
        let pitch = buf.get_u8();
        Ok(Self {
            player_id,
            position,
            yaw,
            pitch,
        })
    }
}
