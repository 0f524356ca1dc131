//! DespawnPlayer (0x0c) — Server → Client.
//!
//! Removes a player entity from the client's world.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DespawnPlayer {
    pub player_id: i8,
}

impl ClassicPacket for DespawnPlayer {
    const ID: u8 = super::id::DESPAWN_PLAYER;
    const PAYLOAD_LEN: usize = 1;
}

impl ProtoEncode for DespawnPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.player_id);
    }
}

impl ProtoDecode for DespawnPlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        Ok(Self {
            player_id: buf.get_i8(),
        })
    }
}
