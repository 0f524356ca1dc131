//! SetBlockClient (0x05) — Client → Server.
//!
//! Sent when the player places or breaks a block.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::BlockPos;

/// Whether the client is breaking or placing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockMode {
    Destroy = 0x00,
    Create = 0x01,
}

impl BlockMode {
    pub fn from_u8(v: u8) -> Result<Self, ProtoError> {
        match v {
            0x00 => Ok(Self::Destroy),
            0x01 => Ok(Self::Create),
            other => Err(ProtoError::MalformedField {
                field: "mode",
                value: other as i64,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlockClient {
    pub position: BlockPos,
    pub mode: BlockMode,
    /// Block held by the player; the result is air when destroying.
    pub block_type: u8,
}

impl ClassicPacket for SetBlockClient {
    const ID: u8 = super::id::SET_BLOCK_CLIENT;
    const PAYLOAD_LEN: usize = 8;
}

impl ProtoEncode for SetBlockClient {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.position.proto_encode(buf);
        buf.put_u8(self.mode as u8);
        buf.put_u8(self.block_type);
    }
}

impl ProtoDecode for SetBlockClient {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        let position = BlockPos::proto_decode(buf)?;
        let mode = BlockMode::from_u8(buf.get_u8())?;
        let block_type = buf.get_u8();
        Ok(Self {
            position,
            mode,
            block_type,
        })
    }
}
