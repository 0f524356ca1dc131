//! Minecraft Classic (protocol 7) packet definitions and framing.

pub mod codec;
pub mod error;
pub mod framing;
pub mod packets;
pub mod types;

pub use error::ProtoError;
pub use framing::PacketBuffer;
pub use packets::Packet;
