//! Per-connection session: one task per client.
//!
//! A session owns its socket, its decode buffer and (once spawned) exactly
//! one player. It is generic over the transport so tests can drive it
//! through in-memory pipes.

mod login;
mod play;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use classic_rs_proto::packets::Disconnect;
use classic_rs_proto::{Packet, PacketBuffer};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tracing::{debug, info, warn};

use crate::dispatcher::PlayerSnapshot;
use crate::error::SessionError;
use crate::outbox::Outbox;
use crate::state::ServerState;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Socket accepted, waiting for Identification.
    Connecting,
    /// Checking the client's credentials.
    Identifying,
    /// Player id held, level streaming.
    Spawning,
    /// In the world.
    Playing,
    /// Leaving; the player is being removed.
    Disconnecting,
    /// Terminal.
    Closed,
}

impl SessionState {
    fn describe(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Spawning => "spawning",
            Self::Playing => "playing",
            Self::Disconnecting => "disconnecting",
            Self::Closed => "closed",
        }
    }
}

/// The player owned by a session.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: i8,
    pub name: String,
    pub snapshot: PlayerSnapshot,
}

pub struct Session<S> {
    state: Arc<ServerState>,
    addr: SocketAddr,
    reader: ReadHalf<S>,
    writer: WriteHalf<S>,
    buffer: PacketBuffer,
    phase: SessionState,
    player: Option<Player>,
    /// Whether the player is known to the dispatcher.
    registered: bool,
    outbox: Arc<Outbox>,
}

impl<S: AsyncRead + AsyncWrite> Session<S> {
    pub fn new(state: Arc<ServerState>, addr: SocketAddr, stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let outbox = Arc::new(Outbox::new(state.settings.outbound_queue));
        Self {
            state,
            addr,
            reader,
            writer,
            buffer: PacketBuffer::new(),
            phase: SessionState::Connecting,
            player: None,
            registered: false,
            outbox,
        }
    }

    /// Drive the session to completion.
    pub async fn run(mut self) {
        debug!("Connection from {}", self.addr);
        let result = self.serve().await;
        let who = self.describe_peer();
        self.leave();

        if let Err(e) = result {
            match &e {
                SessionError::ConnectionClosed => debug!("{who} closed the connection"),
                SessionError::Closed(reason) => info!("{who} disconnected: {reason}"),
                SessionError::Auth(_) | SessionError::Capacity(_) => {
                    info!("Rejected {who}: {e}")
                }
                _ => warn!("Dropping {who}: {e}"),
            }
            if let Some(reason) = e.disconnect_reason() {
                let disconnect = Packet::Disconnect(Disconnect::new(reason));
                if let Err(e) = self.write_packet(&disconnect).await {
                    debug!("Could not send disconnect to {who}: {e}");
                }
            }
        }

        let timeout = self.state.settings.write_timeout;
        let _ = tokio::time::timeout(timeout, self.writer.shutdown()).await;
        self.phase = SessionState::Closed;
    }

    async fn serve(&mut self) -> Result<(), SessionError> {
        let ident = self.await_identification().await?;
        self.phase = SessionState::Identifying;
        let operator = self.authenticate(&ident)?;
        self.spawn(ident.name, operator).await?;
        self.play().await
    }

    // ─── I/O ────────────────────────────────────────────────────────────────

    /// Read whatever the socket has into the decode buffer.
    async fn read_more(&mut self) -> Result<(), SessionError> {
        let read = self.reader.read_buf(self.buffer.buffer_mut()).await?;
        if read == 0 {
            return Err(SessionError::ConnectionClosed);
        }
        Ok(())
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<(), SessionError> {
        self.write_bytes(&packet.to_bytes()).await
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let timeout = self.state.settings.write_timeout;
        let writer = &mut self.writer;
        let write = async move {
            writer.write_all(bytes).await?;
            writer.flush().await
        };
        match tokio::time::timeout(timeout, write).await {
            Ok(result) => result.map_err(SessionError::from),
            Err(_) => Err(SessionError::WriteTimeout),
        }
    }

    /// Write every queued broadcast in one go.
    async fn flush_outbox(&mut self) -> Result<(), SessionError> {
        let packets = self.outbox.drain();
        if packets.is_empty() {
            return Ok(());
        }
        let mut buf = BytesMut::with_capacity(packets.iter().map(Packet::wire_len).sum());
        for packet in &packets {
            packet.encode(&mut buf);
        }
        self.write_bytes(&buf).await
    }
}

impl<S> Session<S> {
    fn describe_peer(&self) -> String {
        match &self.player {
            Some(player) => format!("{} ({})", player.name, self.addr),
            None => self.addr.to_string(),
        }
    }

    fn unexpected(&self, packet: &Packet) -> SessionError {
        SessionError::UnexpectedPacket {
            opcode: packet.opcode(),
            state: self.phase.describe(),
        }
    }

    /// Remove the player from the world and release its id. Runs once no
    /// matter how the session ended.
    fn leave(&mut self) {
        if self.phase >= SessionState::Disconnecting {
            return;
        }
        self.phase = SessionState::Disconnecting;
        if let Some(player) = self.player.take() {
            if self.registered {
                let notice = format!("{} left the game", player.name);
                self.state.dispatcher.unregister(player.id, Some(&notice));
                self.registered = false;
            }
            self.state.release_id(player.id);
            info!("{} ({}) left, freed player id {}", player.name, self.addr, player.id);
        }
        self.outbox.close("Disconnected");
    }
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        self.leave();
    }
}

fn join_error(e: tokio::task::JoinError) -> SessionError {
    SessionError::Io(io::Error::other(e))
}
