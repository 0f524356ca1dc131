//! Identification (0x00) — Bidirectional.
//!
//! The client opens with its username and verification key; the server
//! answers with the same layout carrying its name and MOTD.

use bytes::{Buf, BufMut};

use crate::codec::{
    ensure_remaining, read_string, write_string, ClassicPacket, ProtoDecode, ProtoEncode,
};
use crate::error::ProtoError;

/// User type byte for a regular player.
pub const USER_TYPE_NORMAL: u8 = 0x00;

/// User type byte for an operator.
pub const USER_TYPE_OP: u8 = 0x64;

/// Identification packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub protocol_version: u8,
    /// Username (client → server) or server name (server → client).
    pub name: String,
    /// Verification key (client → server) or MOTD (server → client).
    pub key: String,
    /// Unused by clients; the user type when sent by the server.
    pub user_type: u8,
}

impl Identification {
    /// The server's reply to a successful identification.
    pub fn server_info(
        server_name: impl Into<String>,
        motd: impl Into<String>,
        operator: bool,
    ) -> Self {
        Self {
            protocol_version: super::PROTOCOL_VERSION,
            name: server_name.into(),
            key: motd.into(),
            user_type: if operator {
                USER_TYPE_OP
            } else {
                USER_TYPE_NORMAL
            },
        }
    }
}

impl ClassicPacket for Identification {
    const ID: u8 = super::id::IDENTIFICATION;
    const PAYLOAD_LEN: usize = 130;
}

impl ProtoEncode for Identification {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.protocol_version);
        write_string(buf, &self.name);
        write_string(buf, &self.key);
        buf.put_u8(self.user_type);
    }
}

impl ProtoDecode for Identification {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, Self::PAYLOAD_LEN)?;
        let protocol_version = buf.get_u8();
        let name = read_string(buf)?;
        let key = read_string(buf)?;
        let user_type = buf.get_u8();
        Ok(Self {
            protocol_version,
            name,
            key,
            user_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_layout() {
        let pkt = Identification {
            protocol_version: 7,
            name: "alice".into(),
            key: "0123456789abcdef".into(),
            user_type: 0,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(buf.len(), Identification::PAYLOAD_LEN);
        assert_eq!(buf[0], 7);
        assert_eq!(&buf[1..6], b"alice");
        assert_eq!(buf[64], b' ');
        assert_eq!(&buf[65..81], b"0123456789abcdef");
        assert_eq!(buf[129], 0);
    }

    #[test]
    fn server_info_operator_flag() {
        let op = Identification::server_info("srv", "motd", true);
        assert_eq!(op.user_type, USER_TYPE_OP);
        assert_eq!(op.protocol_version, 7);
        let normal = Identification::server_info("srv", "motd", false);
        assert_eq!(normal.user_type, USER_TYPE_NORMAL);
    }

    #[test]
    fn decode_short_payload() {
        let data = bytes::Bytes::from(vec![7u8; 20]);
        assert!(Identification::proto_decode(&mut data.clone()).is_err());
    }
}
