//! Disconnect (0x0e) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Sent by the server right before it closes the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    /// Shown on the client's disconnect screen.
    pub reason: String,
}

impl Disconnect {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ClassicPacket for Disconnect {
    const ID: u8 = super::id::DISCONNECT;
    const PAYLOAD_LEN: usize = 64;
}

impl ProtoEncode for Disconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.reason);
    }
}

impl ProtoDecode for Disconnect {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            reason: read_string(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_reason() {
        let pkt = Disconnect::new("Server full");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), 64);
        assert_eq!(&buf[..11], b"Server full");
        assert_eq!(buf[11], b' ');
    }
}
