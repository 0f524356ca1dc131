//! The Playing state: block changes, movement and chat.

use classic_rs_proto::packets::{BlockMode, Message, PositionOrientation, SetBlockClient};
use classic_rs_proto::types::{Position, FIXED_POINT_SCALE};
use classic_rs_proto::Packet;
use classic_rs_world::{block, DEPTH, HEIGHT, WIDTH};
use tracing::{info, trace};

use super::*;

/// How far past the world edges (in blocks) a player may report being.
const MOVE_MARGIN: i32 = 4;

fn position_in_bounds(position: Position) -> bool {
    let scale = FIXED_POINT_SCALE as i32;
    let axis = |value: i16, size: usize| {
        (-MOVE_MARGIN * scale..=(size as i32 + MOVE_MARGIN) * scale).contains(&(value as i32))
    };
    axis(position.x, WIDTH) && axis(position.y, HEIGHT) && axis(position.z, DEPTH)
}

impl<S: AsyncRead + AsyncWrite> Session<S> {
    pub(super) async fn play(&mut self) -> Result<(), SessionError> {
        // Anything queued while the level was streaming.
        self.flush_outbox().await?;
        loop {
            while let Some(packet) = self.buffer.next_packet()? {
                self.handle_packet(packet)?;
            }
            tokio::select! {
                read = self.reader.read_buf(self.buffer.buffer_mut()) => {
                    if read? == 0 {
                        return Err(SessionError::ConnectionClosed);
                    }
                }
                _ = self.outbox.notified() => self.flush_outbox().await?,
                reason = self.outbox.closed() => return Err(SessionError::Closed(reason)),
            }
        }
    }

    fn handle_packet(&mut self, packet: Packet) -> Result<(), SessionError> {
        match packet {
            Packet::SetBlockClient(change) => self.handle_set_block(change),
            Packet::PositionOrientation(movement) => self.handle_movement(movement),
            Packet::Message(message) => {
                self.handle_message(message);
                Ok(())
            }
            Packet::Identification(_)
            | Packet::Ping
            | Packet::LevelInitialize
            | Packet::LevelDataChunk(_)
            | Packet::LevelFinalize(_)
            | Packet::SetBlockServer(_)
            | Packet::SpawnPlayer(_)
            | Packet::DespawnPlayer(_)
            | Packet::Disconnect(_)
            | Packet::UpdateUserType(_) => Err(self.unexpected(&packet)),
        }
    }

    fn handle_set_block(&mut self, change: SetBlockClient) -> Result<(), SessionError> {
        if !block::is_valid(change.block_type) {
            return Err(SessionError::InvalidBlock(change.block_type));
        }
        let new_block = match change.mode {
            BlockMode::Destroy => block::AIR,
            BlockMode::Create => change.block_type,
        };
        let previous = self.state.apply_block_change(change.position, new_block)?;
        let pos = change.position;
        trace!(
            "{} set ({}, {}, {}) from {previous} to {new_block}",
            self.describe_peer(),
            pos.x,
            pos.y,
            pos.z
        );
        Ok(())
    }

    fn handle_movement(&mut self, movement: PositionOrientation) -> Result<(), SessionError> {
        let position = movement.position;
        if !position_in_bounds(position) {
            return Err(SessionError::InvalidPosition {
                x: position.x,
                y: position.y,
                z: position.z,
            });
        }
        let Some(player) = self.player.as_mut() else {
            return Ok(());
        };
        player.snapshot = PlayerSnapshot {
            position,
            yaw: movement.yaw,
            pitch: movement.pitch,
        };
        self.state
            .dispatcher
            .update_position(player.id, player.snapshot);
        Ok(())
    }

    fn handle_message(&mut self, message: Message) {
        let Some(player) = &self.player else {
            return;
        };
        if message.message.trim().is_empty() {
            return;
        }
        info!("<{}> {}", player.name, message.message);
        self.state.dispatcher.broadcast(Packet::Message(Message {
            player_id: player.id,
            message: message.message,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_bounds() {
        assert!(position_in_bounds(Position::new(0, 0, 0)));
        assert!(position_in_bounds(Position::new(256 * 32, 64 * 32, 256 * 32)));
        assert!(position_in_bounds(Position::new(4096, 66 * 32, 4096)));
        assert!(position_in_bounds(Position::new(-4 * 32, 0, 0)));
        assert!(!position_in_bounds(Position::new(-4 * 32 - 1, 0, 0)));
        assert!(!position_in_bounds(Position::new(0, 69 * 32, 0)));
        assert!(!position_in_bounds(Position::new(0, 0, 261 * 32)));
        assert!(!position_in_bounds(Position::new(i16::MAX, 0, 0)));
    }
}
