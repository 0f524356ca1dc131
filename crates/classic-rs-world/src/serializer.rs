//! Compressed snapshot format.
//!
//! `gzip([u32 BE block count][block bytes])`: the count sits inside the
//! compressed stream, which is the layout classic clients decode. The same
//! payload is written to disk and streamed to joining clients in level data
//! chunks.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::WorldError;
use crate::world::VOLUME;

/// Length of the big-endian block count header.
const HEADER_LEN: usize = 4;

/// Compress a block grid into a snapshot.
pub fn encode_snapshot(blocks: &[u8]) -> Result<Bytes, WorldError> {
    let mut raw = BytesMut::with_capacity(HEADER_LEN + blocks.len());
    raw.put_u32(blocks.len() as u32);
    raw.put_slice(blocks);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&raw)
        .map_err(|e| WorldError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| WorldError::Compression(e.to_string()))?;
    Ok(Bytes::from(compressed))
}

/// Decompress a snapshot back into a block grid of exactly [`VOLUME`] bytes.
pub fn decode_snapshot(data: &[u8]) -> Result<Vec<u8>, WorldError> {
    // One byte past the expected size is enough to detect oversized input.
    let limit = (HEADER_LEN + VOLUME + 1) as u64;
    let mut raw = Vec::with_capacity(HEADER_LEN + VOLUME);
    GzDecoder::new(data)
        .take(limit)
        .read_to_end(&mut raw)
        .map_err(|e| WorldError::CorruptSnapshot(format!("gzip: {e}")))?;

    if raw.len() < HEADER_LEN {
        return Err(WorldError::CorruptSnapshot(format!(
            "missing block count header ({} bytes)",
            raw.len()
        )));
    }
    let declared = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    let blocks = raw.split_off(HEADER_LEN);

    if declared != VOLUME {
        return Err(WorldError::CorruptSnapshot(format!(
            "declared {declared} blocks, expected {VOLUME}"
        )));
    }
    if blocks.len() != VOLUME {
        return Err(WorldError::CorruptSnapshot(format!(
            "decompressed {} blocks, expected {VOLUME}",
            blocks.len()
        )));
    }
    Ok(blocks)
}
