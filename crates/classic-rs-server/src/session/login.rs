//! Connecting → Identifying → Spawning.

use std::time::Duration;

use classic_rs_proto::packets::{
    Identification, LevelDataChunk, LevelFinalize, Message, PROTOCOL_VERSION,
};
use classic_rs_proto::types::Position;
use classic_rs_proto::Packet;
use classic_rs_world::serializer::encode_snapshot;
use classic_rs_world::{World, DEPTH, HEIGHT, WIDTH};
use tracing::{debug, info};

use super::*;
use crate::auth;
use crate::dispatcher::Peer;
use crate::error::AuthError;
use crate::state::SHUTDOWN_REASON;

/// How long a new connection may take to identify.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Where every player appears.
fn spawn_snapshot() -> PlayerSnapshot {
    let (x, y, z) = World::spawn_point();
    PlayerSnapshot {
        position: Position::from_block(x as i16, y as i16, z as i16),
        yaw: 0,
        pitch: 0,
    }
}

impl<S: AsyncRead + AsyncWrite> Session<S> {
    /// Wait for the client's Identification.
    pub(super) async fn await_identification(&mut self) -> Result<Identification, SessionError> {
        let state = self.state.clone();
        tokio::select! {
            result = tokio::time::timeout(LOGIN_TIMEOUT, self.read_identification()) => {
                result.map_err(|_| SessionError::LoginTimeout)?
            }
            _ = state.shutdown_signal() => Err(SessionError::Closed(SHUTDOWN_REASON.into())),
        }
    }

    async fn read_identification(&mut self) -> Result<Identification, SessionError> {
        loop {
            if let Some(packet) = self.buffer.next_packet()? {
                return match packet {
                    Packet::Identification(ident) => Ok(ident),
                    other => Err(self.unexpected(&other)),
                };
            }
            self.read_more().await?;
        }
    }

    /// Check the identification. Returns whether the player is an operator.
    pub(super) fn authenticate(&self, ident: &Identification) -> Result<bool, AuthError> {
        if ident.protocol_version != PROTOCOL_VERSION {
            return Err(AuthError::ProtocolVersion(ident.protocol_version));
        }
        let name = ident.name.as_str();
        if !auth::is_valid_name(name) {
            return Err(AuthError::InvalidName(name.to_string()));
        }
        if self.state.settings.verify_names && !auth::verify(&self.state.salt, name, &ident.key) {
            return Err(AuthError::BadKey(name.to_string()));
        }

        let permissions = self.state.permissions.lock();
        if let Some(reason) = permissions.ban_reason(name) {
            return Err(AuthError::Banned {
                name: name.to_string(),
                reason: reason.to_string(),
            });
        }
        if self.state.dispatcher.find(name).is_some() {
            return Err(AuthError::AlreadyOnline(name.to_string()));
        }
        Ok(permissions.is_op(name))
    }

    /// Allocate an id, stream the level and enter the world.
    pub(super) async fn spawn(&mut self, name: String, operator: bool) -> Result<(), SessionError> {
        let id = self.state.allocate_id()?;
        let snapshot = spawn_snapshot();
        self.player = Some(Player {
            id,
            name: name.clone(),
            snapshot,
        });
        self.phase = SessionState::Spawning;
        info!("{name} ({}) joining as player {id}", self.addr);

        let settings = &self.state.settings;
        let greeting = Identification::server_info(&settings.name, &settings.motd, operator);
        self.write_packet(&Packet::Identification(greeting)).await?;

        let peer = Peer::new(id, name.clone(), self.addr, self.outbox.clone(), snapshot);
        let blocks = self.state.join_world(peer)?;
        self.registered = true;

        self.write_packet(&Packet::LevelInitialize).await?;
        let level = tokio::task::spawn_blocking(move || encode_snapshot(&blocks))
            .await
            .map_err(join_error)??;
        let chunks = LevelDataChunk::split(&level);
        debug!(
            "Sending {} bytes of level data to {name} in {} chunks",
            level.len(),
            chunks.len()
        );
        for chunk in chunks {
            if let Some(reason) = self.outbox.close_reason() {
                return Err(SessionError::Closed(reason));
            }
            self.write_packet(&Packet::LevelDataChunk(chunk)).await?;
        }
        self.write_packet(&Packet::LevelFinalize(LevelFinalize {
            x_size: WIDTH as u16,
            y_size: HEIGHT as u16,
            z_size: DEPTH as u16,
        }))
        .await?;

        self.state.dispatcher.promote(id);
        self.phase = SessionState::Playing;
        self.state
            .dispatcher
            .broadcast(Packet::Message(Message::system(format!(
                "{name} joined the game"
            ))));
        Ok(())
    }
}
