//! Base data types used throughout the classic protocol.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Sub-block precision of player coordinates: one block is 32 units.
pub const FIXED_POINT_SCALE: i16 = 32;

// ---------------------------------------------------------------------------
// Position (fixed-point i16 x, y, z)
// ---------------------------------------------------------------------------

/// A player position in fixed-point units (block coordinate × 32).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Position {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// The fixed-point position of the corner of a block.
    pub const fn from_block(x: i16, y: i16, z: i16) -> Self {
        Self {
            x: x * FIXED_POINT_SCALE,
            y: y * FIXED_POINT_SCALE,
            z: z * FIXED_POINT_SCALE,
        }
    }

    /// The block this position lies in.
    pub fn block(&self) -> BlockPos {
        BlockPos {
            x: self.x.div_euclid(FIXED_POINT_SCALE),
            y: self.y.div_euclid(FIXED_POINT_SCALE),
            z: self.z.div_euclid(FIXED_POINT_SCALE),
        }
    }
}

impl ProtoEncode for Position {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
    }
}

impl ProtoDecode for Position {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 6)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = f32::from(FIXED_POINT_SCALE);
        write!(
            f,
            "({:.2}, {:.2}, {:.2})",
            f32::from(self.x) / scale,
            f32::from(self.y) / scale,
            f32::from(self.z) / scale
        )
    }
}

// ---------------------------------------------------------------------------
// BlockPos (i16 x, y, z)
// ---------------------------------------------------------------------------

/// A block coordinate as sent on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl BlockPos {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

impl ProtoEncode for BlockPos {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
    }
}

impl ProtoDecode for BlockPos {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 6)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
        })
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn position_big_endian() {
        let mut buf = BytesMut::new();
        Position::new(0x0102, -1, 0x7FFF).proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x01, 0x02, 0xFF, 0xFF, 0x7F, 0xFF]);
    }

    #[test]
    fn position_from_block() {
        let pos = Position::from_block(128, 32, 128);
        assert_eq!(pos, Position::new(4096, 1024, 4096));
        assert_eq!(pos.block(), BlockPos::new(128, 32, 128));
    }

    #[test]
    fn negative_position_rounds_down() {
        let pos = Position::new(-1, 31, 33);
        assert_eq!(pos.block(), BlockPos::new(-1, 0, 1));
    }

    #[test]
    fn block_pos_too_short() {
        let data = bytes::Bytes::from_static(&[0, 1, 0, 2]);
        assert!(BlockPos::proto_decode(&mut data.clone()).is_err());
    }

    #[test]
    fn display_position() {
        let pos = Position::new(48, 32, 16);
        assert_eq!(pos.to_string(), "(1.50, 1.00, 0.50)");
    }
}
