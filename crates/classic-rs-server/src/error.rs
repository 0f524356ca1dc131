//! Session errors and the disconnect reason each one carries.

use std::io;

use classic_rs_proto::ProtoError;
use classic_rs_world::WorldError;
use thiserror::Error;

/// Identification rejected.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unsupported protocol version {0}")]
    ProtocolVersion(u8),
    #[error("invalid player name {0:?}")]
    InvalidName(String),
    #[error("verification key mismatch for {0}")]
    BadKey(String),
    #[error("{name} is banned: {reason}")]
    Banned { name: String, reason: String },
    #[error("{0} is already online")]
    AlreadyOnline(String),
}

/// No room for another player.
#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("server is full ({max} players)")]
    ServerFull { max: usize },
}

/// Anything that ends a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),
    #[error("world error: {0}")]
    World(#[from] WorldError),
    #[error("unexpected packet 0x{opcode:02X} while {state}")]
    UnexpectedPacket { opcode: u8, state: &'static str },
    #[error("invalid block type {0}")]
    InvalidBlock(u8),
    #[error("position ({x}, {y}, {z}) is outside the world")]
    InvalidPosition { x: i16, y: i16, z: i16 },
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Capacity(#[from] CapacityError),
    #[error("login timed out")]
    LoginTimeout,
    #[error("write timed out")]
    WriteTimeout,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
    /// Closed from outside the session: kick, ban, overflow or shutdown.
    #[error("closed: {0}")]
    Closed(String),
}

impl SessionError {
    /// The reason sent in a Disconnect packet, or `None` if the socket is
    /// already unusable.
    pub fn disconnect_reason(&self) -> Option<String> {
        let reason = match self {
            Self::Protocol(_) | Self::UnexpectedPacket { .. } => "Protocol error".to_string(),
            Self::World(WorldError::OutOfBounds { .. }) | Self::InvalidPosition { .. } => {
                "Illegal position".to_string()
            }
            Self::World(_) => "Server error".to_string(),
            Self::InvalidBlock(_) => "Illegal block type".to_string(),
            Self::Auth(AuthError::ProtocolVersion(_)) => "Unsupported protocol version".to_string(),
            Self::Auth(AuthError::InvalidName(_)) => "Invalid name".to_string(),
            Self::Auth(AuthError::BadKey(_)) => "Failed to verify name".to_string(),
            Self::Auth(AuthError::Banned { reason, .. }) => format!("Banned: {reason}"),
            Self::Auth(AuthError::AlreadyOnline(_)) => "Already logged in".to_string(),
            Self::Capacity(_) => "Server is full".to_string(),
            Self::LoginTimeout => "Login timed out".to_string(),
            Self::Closed(reason) => reason.clone(),
            Self::WriteTimeout | Self::Io(_) | Self::ConnectionClosed => return None,
        };
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_for_client_faults() {
        assert_eq!(
            SessionError::from(ProtoError::UnknownOpcode(0x99))
                .disconnect_reason()
                .as_deref(),
            Some("Protocol error")
        );
        assert_eq!(
            SessionError::from(WorldError::OutOfBounds { x: 300, y: 0, z: 0 })
                .disconnect_reason()
                .as_deref(),
            Some("Illegal position")
        );
        assert_eq!(
            SessionError::from(CapacityError::ServerFull { max: 1 })
                .disconnect_reason()
                .as_deref(),
            Some("Server is full")
        );
        assert_eq!(
            SessionError::from(AuthError::Banned {
                name: "eve".into(),
                reason: "griefing".into()
            })
            .disconnect_reason()
            .as_deref(),
            Some("Banned: griefing")
        );
    }

    #[test]
    fn no_reason_for_dead_sockets() {
        assert!(SessionError::ConnectionClosed.disconnect_reason().is_none());
        assert!(SessionError::WriteTimeout.disconnect_reason().is_none());
        assert!(SessionError::from(io::Error::from(io::ErrorKind::BrokenPipe))
            .disconnect_reason()
            .is_none());
    }
}
