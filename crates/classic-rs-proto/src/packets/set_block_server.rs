//! SetBlockServer (0x06) — Server → Client.
//!
//! Sent when a single block changes in the world.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::BlockPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlockServer {
    pub position: BlockPos,
    pub block_type: u8,
}

impl ClassicPacket for SetBlockServer {
    const ID: u8 = super::id::SET_BLOCK_SERVER;
    const PAYLOAD_LEN: usize = 7;
}

impl ProtoEncode for SetBlockServer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.position.proto_encode(buf);
        buf.put_u8(self.block_type);
    }
}

impl ProtoDecode for SetBlockServer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        let position = BlockPos::proto_decode(buf)?;
        let block_type = buf.get_u8();
        Ok(Self {
            position,
            block_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_set_block() {
        let pkt = SetBlockServer {
            position: BlockPos::new(255, 63, 0),
            block_type: 49,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0, 255, 0, 63, 0, 0, 49]);
    }
}
