//! LevelDataChunk (0x03) — Server → Client.
//!
//! One slice of the compressed world snapshot.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{ensure_remaining, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Payload bytes carried by a single chunk.
pub const CHUNK_DATA_LEN: usize = 1024;

/// LevelDataChunk packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDataChunk {
    /// Meaningful bytes; zero-padded to 1024 on the wire.
    pub data: Bytes,
    /// Transfer progress, 0-100.
    pub percent_complete: u8,
}

impl LevelDataChunk {
    pub fn new(data: Bytes, percent_complete: u8) -> Result<Self, ProtoError> {
        if data.len() > CHUNK_DATA_LEN {
            return Err(ProtoError::ChunkTooLarge(data.len()));
        }
        Ok(Self {
            data,
            percent_complete,
        })
    }

    /// Split a snapshot into the chunk sequence sent to a joining client.
    ///
    /// Progress rises with every chunk and the last one reports 100.
    pub fn split(snapshot: &Bytes) -> Vec<LevelDataChunk> {
        let count = snapshot.len().div_ceil(CHUNK_DATA_LEN).max(1);
        (0..count)
            .map(|index| {
                let start = index * CHUNK_DATA_LEN;
                let end = (start + CHUNK_DATA_LEN).min(snapshot.len());
                LevelDataChunk {
                    data: snapshot.slice(start..end),
                    percent_complete: ((index + 1) * 100 / count) as u8,
                }
            })
            .collect()
    }
}

impl ClassicPacket for LevelDataChunk {
    const ID: u8 = super::id::LEVEL_DATA_CHUNK;
    const PAYLOAD_LEN: usize = 2 + CHUNK_DATA_LEN + 1;
}

impl ProtoEncode for LevelDataChunk {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u16(self.data.len() as u16);
        buf.put_slice(&self.data);
        buf.put_bytes(0, CHUNK_DATA_LEN - self.data.len());
        buf.put_u8(self.percent_complete);
    }
}

impl ProtoDecode for LevelDataChunk {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        let length = buf.get_u16() as usize;
        if length > CHUNK_DATA_LEN {
            return Err(ProtoError::MalformedField {
                field: "chunk_length",
                value: length as i64,
            });
        }
        let mut data = buf.copy_to_bytes(CHUNK_DATA_LEN);
        data.truncate(length);
        let percent_complete = buf.get_u8();
        Ok(Self {
            data,
            percent_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn final_chunk_zero_padded() {
        let pkt = LevelDataChunk::new(Bytes::from_static(&[1, 2, 3]), 100).unwrap();
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), LevelDataChunk::PAYLOAD_LEN);
        assert_eq!(&buf[..2], &[0, 3]);
        assert_eq!(&buf[2..5], &[1, 2, 3]);
        assert!(buf[5..2 + CHUNK_DATA_LEN].iter().all(|&b| b == 0));
        assert_eq!(buf[2 + CHUNK_DATA_LEN], 100);
    }

    #[test]
    fn oversized_chunk_rejected() {
        let data = Bytes::from(vec![0u8; CHUNK_DATA_LEN + 1]);
        assert_eq!(
            LevelDataChunk::new(data, 0),
            Err(ProtoError::ChunkTooLarge(CHUNK_DATA_LEN + 1))
        );
    }

    #[test]
    fn decode_rejects_bad_length() {
        let mut buf = BytesMut::new();
        buf.put_u16(2000);
        buf.put_bytes(0, CHUNK_DATA_LEN + 1);
        assert!(matches!(
            LevelDataChunk::proto_decode(&mut buf.freeze()),
            Err(ProtoError::MalformedField { field: "chunk_length", .. })
        ));
    }

    #[test]
    fn split_progress_reaches_100() {
        let snapshot = Bytes::from((0..2500u32).map(|i| i as u8).collect::<Vec<_>>());
        let chunks = LevelDataChunk::split(&snapshot);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].data.len(), 1024);
        assert_eq!(chunks[2].data.len(), 2500 - 2048);
        assert!(chunks
            .windows(2)
            .all(|w| w[0].percent_complete < w[1].percent_complete));
        assert_eq!(chunks.last().unwrap().percent_complete, 100);

        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(joined, snapshot.to_vec());
    }

    #[test]
    fn split_small_snapshot_is_one_chunk() {
        let chunks = LevelDataChunk::split(&Bytes::from_static(&[9, 9, 9, 9]));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].percent_complete, 100);
    }
}
