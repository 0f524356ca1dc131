//! SpawnPlayer (0x07) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{
    ensure_remaining, read_string, write_string, ClassicPacket, ProtoDecode, ProtoEncode,
};
use crate::error::ProtoError;
use crate::types::Position;

/// Makes a player entity appear on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnPlayer {
    pub player_id: i8,
    pub name: String,
    pub position: Position,
    pub yaw: u8,
    pub pitch: u8,
}

impl ClassicPacket for SpawnPlayer {
    const ID: u8 = super::id::SPAWN_PLAYER;
    const PAYLOAD_LEN: usize = 73;
}

impl ProtoEncode for SpawnPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.player_id);
        write_string(buf, &self.name);
        self.position.proto_encode(buf);
        buf.put_u8(self.yaw);
        buf.put_u8(self.pitch);
    }
}

impl ProtoDecode for SpawnPlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        let player_id = buf.get_i8();
        let name = read_string(buf)?;
        let position = Position::proto_decode(buf)?;
        let yaw = buf.get_u8();
        let pitch = buf.get_u8();
        Ok(Self {
            player_id,
            name,
            position,
            yaw,
            pitch,
        })
    }
}
