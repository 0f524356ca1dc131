//! Message (0x0d) — Bidirectional.
//!
//! Chat and system messages.

use bytes::{Buf, BufMut};

use crate::codec::{
    ensure_remaining, read_string, write_string, ClassicPacket, ProtoDecode, ProtoEncode,
};
use crate::error::ProtoError;

/// Sender id used for messages that come from the server itself.
pub const SYSTEM_SENDER: i8 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Sender's player id (server → client); unused from clients.
    pub player_id: i8,
    pub message: String,
}

impl Message {
    /// A server notice not attributed to any player.
    pub fn system(message: impl Into<String>) -> Self {
        Self {
            player_id: SYSTEM_SENDER,
            message: message.into(),
        }
    }
}

impl ClassicPacket for Message {
    const ID: u8 = super::id::MESSAGE;
    const PAYLOAD_LEN: usize = 65;
}

impl ProtoEncode for Message {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i8(self.player_id);
        write_string(buf, &self.message);
    }
}

impl ProtoDecode for Message {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        let player_id = buf.get_i8();
        let message = read_string(buf)?;
        Ok(Self { player_id, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn system_message() {
        let pkt = Message::system("Autosaving the world...");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), Message::PAYLOAD_LEN);
        assert_eq!(buf[0], 0xFF);
        let decoded = Message::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.message, "Autosaving the world...");
    }
}
