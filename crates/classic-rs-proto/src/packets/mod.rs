//! Packet definitions for the classic protocol.
//!
//! Every packet is one opcode byte followed by a payload whose size is fixed
//! by the opcode. There is no length prefix, so the decoder must know each
//! payload size up front (see [`payload_len`]).

pub mod despawn_player;
pub mod disconnect;
pub mod identification;
pub mod level_data_chunk;
pub mod level_finalize;
pub mod message;
pub mod position_orientation;
pub mod set_block_client;
pub mod set_block_server;
pub mod spawn_player;
pub mod update_user_type;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{ClassicPacket, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

pub use despawn_player::DespawnPlayer;
pub use disconnect::Disconnect;
pub use identification::{Identification, USER_TYPE_NORMAL, USER_TYPE_OP};
pub use level_data_chunk::{LevelDataChunk, CHUNK_DATA_LEN};
pub use level_finalize::LevelFinalize;
pub use message::{Message, SYSTEM_SENDER};
pub use position_orientation::PositionOrientation;
pub use set_block_client::{BlockMode, SetBlockClient};
pub use set_block_server::SetBlockServer;
pub use spawn_player::SpawnPlayer;
pub use update_user_type::UpdateUserType;

/// Packet opcodes.
pub mod id {
    pub const IDENTIFICATION: u8 = 0x00;
    pub const PING: u8 = 0x01;
    pub const LEVEL_INITIALIZE: u8 = 0x02;
    pub const LEVEL_DATA_CHUNK: u8 = 0x03;
    pub const LEVEL_FINALIZE: u8 = 0x04;
    pub const SET_BLOCK_CLIENT: u8 = 0x05;
    pub const SET_BLOCK_SERVER: u8 = 0x06;
    pub const SPAWN_PLAYER: u8 = 0x07;
    pub const POSITION_ORIENTATION: u8 = 0x08;
    pub const DESPAWN_PLAYER: u8 = 0x0C;
    pub const MESSAGE: u8 = 0x0D;
    pub const DISCONNECT: u8 = 0x0E;
    pub const UPDATE_USER_TYPE: u8 = 0x0F;
}

/// Protocol version spoken by this server (Classic 0.30).
pub const PROTOCOL_VERSION: u8 = 0x07;

/// Largest payload of any opcode (LevelDataChunk).
pub const MAX_PAYLOAD_LEN: usize = LevelDataChunk::PAYLOAD_LEN;

/// Payload size for an opcode, or `None` if the opcode is unknown.
pub fn payload_len(opcode: u8) -> Option<usize> {
    let len = match opcode {
        id::IDENTIFICATION => Identification::PAYLOAD_LEN,
        id::PING | id::LEVEL_INITIALIZE => 0,
        id::LEVEL_DATA_CHUNK => LevelDataChunk::PAYLOAD_LEN,
        id::LEVEL_FINALIZE => LevelFinalize::PAYLOAD_LEN,
        id::SET_BLOCK_CLIENT => SetBlockClient::PAYLOAD_LEN,
        id::SET_BLOCK_SERVER => SetBlockServer::PAYLOAD_LEN,
        id::SPAWN_PLAYER => SpawnPlayer::PAYLOAD_LEN,
        id::POSITION_ORIENTATION => PositionOrientation::PAYLOAD_LEN,
        id::DESPAWN_PLAYER => DespawnPlayer::PAYLOAD_LEN,
        id::MESSAGE => Message::PAYLOAD_LEN,
        id::DISCONNECT => Disconnect::PAYLOAD_LEN,
        id::UPDATE_USER_TYPE => UpdateUserType::PAYLOAD_LEN,
        _ => return None,
    };
    Some(len)
}

/// Any classic packet, one variant per opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Identification(Identification),
    Ping,
    LevelInitialize,
    LevelDataChunk(LevelDataChunk),
    LevelFinalize(LevelFinalize),
    SetBlockClient(SetBlockClient),
    SetBlockServer(SetBlockServer),
    SpawnPlayer(SpawnPlayer),
    PositionOrientation(PositionOrientation),
    DespawnPlayer(DespawnPlayer),
    Message(Message),
    Disconnect(Disconnect),
    UpdateUserType(UpdateUserType),
}

impl Packet {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Identification(_) => id::IDENTIFICATION,
            Self::Ping => id::PING,
            Self::LevelInitialize => id::LEVEL_INITIALIZE,
            Self::LevelDataChunk(_) => id::LEVEL_DATA_CHUNK,
            Self::LevelFinalize(_) => id::LEVEL_FINALIZE,
            Self::SetBlockClient(_) => id::SET_BLOCK_CLIENT,
            Self::SetBlockServer(_) => id::SET_BLOCK_SERVER,
            Self::SpawnPlayer(_) => id::SPAWN_PLAYER,
            Self::PositionOrientation(_) => id::POSITION_ORIENTATION,
            Self::DespawnPlayer(_) => id::DESPAWN_PLAYER,
            Self::Message(_) => id::MESSAGE,
            Self::Disconnect(_) => id::DISCONNECT,
            Self::UpdateUserType(_) => id::UPDATE_USER_TYPE,
        }
    }

    /// Size of this packet on the wire, opcode included.
    pub fn wire_len(&self) -> usize {
        1 + payload_len(self.opcode()).unwrap_or(0)
    }

    /// Write the opcode and payload.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.opcode());
        match self {
            Self::Identification(p) => p.proto_encode(buf),
            Self::Ping | Self::LevelInitialize => {}
            Self::LevelDataChunk(p) => p.proto_encode(buf),
            Self::LevelFinalize(p) => p.proto_encode(buf),
            Self::SetBlockClient(p) => p.proto_encode(buf),
            Self::SetBlockServer(p) => p.proto_encode(buf),
            Self::SpawnPlayer(p) => p.proto_encode(buf),
            Self::PositionOrientation(p) => p.proto_encode(buf),
            Self::DespawnPlayer(p) => p.proto_encode(buf),
            Self::Message(p) => p.proto_encode(buf),
            Self::Disconnect(p) => p.proto_encode(buf),
            Self::UpdateUserType(p) => p.proto_encode(buf),
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode the payload of a packet whose opcode has already been consumed.
    pub fn decode(opcode: u8, buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let packet = match opcode {
            id::IDENTIFICATION => Self::Identification(Identification::proto_decode(buf)?),
            id::PING => Self::Ping,
            id::LEVEL_INITIALIZE => Self::LevelInitialize,
            id::LEVEL_DATA_CHUNK => Self::LevelDataChunk(LevelDataChunk::proto_decode(buf)?),
            id::LEVEL_FINALIZE => Self::LevelFinalize(LevelFinalize::proto_decode(buf)?),
            id::SET_BLOCK_CLIENT => Self::SetBlockClient(SetBlockClient::proto_decode(buf)?),
            id::SET_BLOCK_SERVER => Self::SetBlockServer(SetBlockServer::proto_decode(buf)?),
            id::SPAWN_PLAYER => Self::SpawnPlayer(SpawnPlayer::proto_decode(buf)?),
            id::POSITION_ORIENTATION => {
                Self::PositionOrientation(PositionOrientation::proto_decode(buf)?)
            }
            id::DESPAWN_PLAYER => Self::DespawnPlayer(DespawnPlayer::proto_decode(buf)?),
            id::MESSAGE => Self::Message(Message::proto_decode(buf)?),
            id::DISCONNECT => Self::Disconnect(Disconnect::proto_decode(buf)?),
            id::UPDATE_USER_TYPE => Self::UpdateUserType(UpdateUserType::proto_decode(buf)?),
            other => return Err(ProtoError::UnknownOpcode(other)),
        };
        Ok(packet)
    }
}
