//! Incremental packet framing over a byte stream.
//!
//! TCP reads can split a packet or carry several at once. [`PacketBuffer`]
//! accumulates raw bytes and yields packets only once they are complete.

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::error::ProtoError;
use crate::packets::{self, Packet, MAX_PAYLOAD_LEN};

/// Per-connection decode state: pending bytes plus the opcode being waited on.
#[derive(Debug, Default)]
pub struct PacketBuffer {
    buf: BytesMut,
    /// Opcode and payload size of the packet at the head of `buf`, once known.
    expected: Option<(u8, usize)>,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(1 + MAX_PAYLOAD_LEN),
            expected: None,
        }
    }

    /// Append bytes received from the socket.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// The raw buffer, for reading from a socket directly into it.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Bytes received but not yet consumed by a packet.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// The opcode whose payload is still incomplete, if any.
    pub fn expected_opcode(&self) -> Option<u8> {
        self.expected.map(|(opcode, _)| opcode)
    }

    /// Decode the next complete packet.
    ///
    /// Returns `Ok(None)` when more bytes are needed. An unknown opcode is an
    /// error after which the stream can no longer be trusted.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, ProtoError> {
        let (opcode, len) = match self.expected {
            Some(head) => head,
            None => {
                let Some(&opcode) = self.buf.first() else {
                    return Ok(None);
                };
                let len = packets::payload_len(opcode).ok_or(ProtoError::UnknownOpcode(opcode))?;
                self.expected = Some((opcode, len));
                (opcode, len)
            }
        };

        if self.buf.len() < 1 + len {
            trace!(
                "waiting for opcode 0x{opcode:02X}: have {} of {} bytes",
                self.buf.len(),
                1 + len
            );
            return Ok(None);
        }

        let mut frame = self.buf.split_to(1 + len).freeze();
        frame.advance(1);
        self.expected = None;
        Packet::decode(opcode, &mut frame).map(Some)
    }

    /// Lazily decode every complete packet currently buffered.
    ///
    /// The iterator stops after the first error.
    pub fn packets(&mut self) -> impl Iterator<Item = Result<Packet, ProtoError>> + '_ {
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed {
                return None;
            }
            match self.next_packet() {
                Ok(Some(packet)) => Some(Ok(packet)),
                Ok(None) => None,
                Err(e) => {
                    failed = true;
                    Some(Err(e))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{DespawnPlayer, Message, SetBlockServer};
    use crate::types::BlockPos;

    fn set_block(x: i16) -> Packet {
        Packet::SetBlockServer(SetBlockServer {
            position: BlockPos::new(x, 1, 2),
            block_type: 3,
        })
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        let mut buffer = PacketBuffer::new();
        assert_eq!(buffer.next_packet(), Ok(None));
        assert_eq!(buffer.expected_opcode(), None);
    }

    #[test]
    fn packet_split_across_reads() {
        let bytes = Packet::Message(Message {
            player_id: 1,
            message: "split me".into(),
        })
        .to_bytes();
        let mut buffer = PacketBuffer::new();

        for (i, byte) in bytes.iter().enumerate() {
            buffer.extend(&[*byte]);
            if i + 1 < bytes.len() {
                assert_eq!(buffer.next_packet(), Ok(None));
                assert_eq!(buffer.expected_opcode(), Some(packets::id::MESSAGE));
            }
        }
        let packet = buffer.next_packet().unwrap().unwrap();
        assert_eq!(
            packet,
            Packet::Message(Message {
                player_id: 1,
                message: "split me".into(),
            })
        );
        assert_eq!(buffer.pending(), 0);
        assert_eq!(buffer.expected_opcode(), None);
    }

    #[test]
    fn several_packets_in_one_read() {
        let mut data = Vec::new();
        for x in 0..3 {
            data.extend_from_slice(&set_block(x).to_bytes());
        }
        data.extend_from_slice(&Packet::Ping.to_bytes());
        // Half of a trailing packet.
        let despawn = Packet::DespawnPlayer(DespawnPlayer { player_id: 9 }).to_bytes();
        data.push(despawn[0]);

        let mut buffer = PacketBuffer::new();
        buffer.extend(&data);
        let packets: Vec<Packet> = buffer.packets().map(Result::unwrap).collect();
        assert_eq!(
            packets,
            vec![set_block(0), set_block(1), set_block(2), Packet::Ping]
        );
        assert_eq!(buffer.pending(), 1);

        buffer.extend(&despawn[1..]);
        assert_eq!(
            buffer.next_packet().unwrap(),
            Some(Packet::DespawnPlayer(DespawnPlayer { player_id: 9 }))
        );
    }

    #[test]
    fn unknown_opcode_is_fatal() {
        let mut buffer = PacketBuffer::new();
        buffer.extend(&Packet::Ping.to_bytes());
        buffer.extend(&[0x99, 0, 0]);
        let results: Vec<_> = buffer.packets().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Ok(Packet::Ping));
        assert_eq!(results[1], Err(ProtoError::UnknownOpcode(0x99)));
    }

    #[test]
    fn reading_into_buffer_mut() {
        let mut buffer = PacketBuffer::new();
        buffer
            .buffer_mut()
            .extend_from_slice(&Packet::LevelInitialize.to_bytes());
        assert_eq!(buffer.next_packet(), Ok(Some(Packet::LevelInitialize)));
    }
}
