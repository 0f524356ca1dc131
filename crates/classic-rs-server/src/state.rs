//! Shared server state handed to every session.

use std::io;
use std::time::Duration;

use classic_rs_proto::packets::SetBlockServer;
use classic_rs_proto::types::BlockPos;
use classic_rs_proto::Packet;
use classic_rs_world::serializer::encode_snapshot;
use classic_rs_world::storage::WorldStorage;
use classic_rs_world::{World, WorldError};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::config::ServerConfig;
use crate::dispatcher::{Dispatcher, Peer};
use crate::error::{AuthError, CapacityError};
use crate::permissions::PermissionManager;
use crate::player_ids::PlayerIdTable;

/// Software name reported to clients and the heartbeat.
pub const SOFTWARE_NAME: &str = concat!("classic-rs ", env!("CARGO_PKG_VERSION"));

/// Disconnect reason sent to everyone when the server stops.
pub const SHUTDOWN_REASON: &str = "Server shutting down";

/// Settings sessions need at runtime.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub name: String,
    pub motd: String,
    pub port: u16,
    pub max_players: usize,
    pub public: bool,
    pub verify_names: bool,
    pub outbound_queue: usize,
    pub write_timeout: Duration,
}

impl ServerSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            name: config.server.name.clone(),
            motd: config.server.motd.clone(),
            port: config.server.port,
            max_players: config.server.max_players as usize,
            public: config.server.public,
            verify_names: config.server.verify_names,
            outbound_queue: config.network.outbound_queue,
            write_timeout: Duration::from_secs(config.network.write_timeout),
        }
    }
}

/// What the heartbeat collaborator reports about this server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatInfo {
    pub name: String,
    pub motd: String,
    pub port: u16,
    pub users: usize,
    pub max: usize,
    pub public: bool,
    pub salt: String,
    pub software: &'static str,
}

pub struct ServerState {
    pub settings: ServerSettings,
    /// Salt for name verification, shared with the heartbeat.
    pub salt: String,
    world: Mutex<World>,
    player_ids: Mutex<PlayerIdTable>,
    pub dispatcher: Dispatcher,
    pub permissions: Mutex<PermissionManager>,
    shutdown: watch::Sender<bool>,
}

impl ServerState {
    pub fn new(
        settings: ServerSettings,
        world: World,
        permissions: PermissionManager,
        salt: String,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            player_ids: Mutex::new(PlayerIdTable::new(settings.max_players)),
            settings,
            salt,
            world: Mutex::new(world),
            dispatcher: Dispatcher::new(),
            permissions: Mutex::new(permissions),
            shutdown,
        }
    }

    // ─── Player ids ─────────────────────────────────────────────────────────

    pub fn allocate_id(&self) -> Result<i8, CapacityError> {
        self.player_ids.lock().allocate()
    }

    pub fn release_id(&self, id: i8) -> bool {
        self.player_ids.lock().release(id)
    }

    #[cfg(test)]
    pub fn ids_in_use(&self) -> usize {
        self.player_ids.lock().in_use()
    }

    // ─── World ──────────────────────────────────────────────────────────────

    /// Register a joining peer and copy the grid it will be sent.
    ///
    /// Both happen under the world lock, so every change accepted after the
    /// copy is also queued for the peer.
    pub fn join_world(&self, peer: Peer) -> Result<Vec<u8>, AuthError> {
        let world = self.world.lock();
        self.dispatcher.register(peer)?;
        Ok(world.blocks().to_vec())
    }

    /// Apply a block change and fan it out to every session, the originator
    /// included. Changes are applied and queued under one lock, so all
    /// sessions see them in the same order.
    pub fn apply_block_change(&self, position: BlockPos, block: u8) -> Result<u8, WorldError> {
        let mut world = self.world.lock();
        let previous = world.set(
            position.x as i32,
            position.y as i32,
            position.z as i32,
            block,
        )?;
        self.dispatcher
            .broadcast_world(Packet::SetBlockServer(SetBlockServer {
                position,
                block_type: block,
            }));
        Ok(previous)
    }

    #[cfg(test)]
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Result<u8, WorldError> {
        self.world.lock().get(x, y, z)
    }

    /// Compress the current grid and write it to storage off the async runtime.
    pub async fn save_world(&self, storage: &WorldStorage) -> Result<(), WorldError> {
        let blocks = self.world.lock().blocks().to_vec();
        let target = storage.clone();
        tokio::task::spawn_blocking(move || {
            let snapshot = encode_snapshot(&blocks)?;
            target.save_snapshot(&snapshot)
        })
        .await
        .map_err(|e| WorldError::Io(io::Error::other(e)))??;
        debug!("World saved to {}", storage.path().display());
        Ok(())
    }

    // ─── Metadata ───────────────────────────────────────────────────────────

    pub fn heartbeat_info(&self) -> HeartbeatInfo {
        HeartbeatInfo {
            name: self.settings.name.clone(),
            motd: self.settings.motd.clone(),
            port: self.settings.port,
            users: self.dispatcher.playing_count(),
            max: self.settings.max_players,
            public: self.settings.public,
            salt: self.salt.clone(),
            software: SOFTWARE_NAME,
        }
    }

    // ─── Shutdown ───────────────────────────────────────────────────────────

    /// Stop accepting players and disconnect everyone with `reason`.
    pub fn shutdown(&self, reason: &str) {
        self.shutdown.send_replace(true);
        self.dispatcher.close_all(reason);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once [`ServerState::shutdown`] has been called.
    pub async fn shutdown_signal(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|stopping| *stopping).await;
    }
}

#[cfg(test)]
impl ServerSettings {
    pub(crate) fn for_tests(max_players: usize) -> Self {
        Self {
            name: "Test Server".into(),
            motd: "Testing".into(),
            port: 25565,
            max_players,
            public: false,
            verify_names: false,
            outbound_queue: crate::config::MIN_OUTBOUND_QUEUE,
            write_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use crate::dispatcher::PlayerSnapshot;
    use crate::outbox::Outbox;

    fn state(max_players: usize) -> ServerState {
        ServerState::new(
            ServerSettings::for_tests(max_players),
            World::new(),
            PermissionManager::default(),
            "0123456789abcdef".into(),
        )
    }

    fn peer(id: i8, name: &str) -> (Peer, Arc<Outbox>) {
        let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let outbox = Arc::new(Outbox::new(64));
        (
            Peer::new(id, name, addr, outbox.clone(), PlayerSnapshot::default()),
            outbox,
        )
    }

    #[test]
    fn block_change_reaches_loading_and_playing_peers() {
        let state = state(4);
        let (alice, alice_out) = peer(0, "alice");
        let (bob, bob_out) = peer(1, "bob");
        state.join_world(alice).unwrap();
        state.dispatcher.promote(0);
        alice_out.drain();
        let grid = state.join_world(bob).unwrap();
        assert!(grid.iter().all(|&b| b == 0));

        let previous = state
            .apply_block_change(BlockPos::new(10, 5, 10), 1)
            .unwrap();
        assert_eq!(previous, 0);
        assert_eq!(state.block_at(10, 5, 10).unwrap(), 1);

        let expected = Packet::SetBlockServer(SetBlockServer {
            position: BlockPos::new(10, 5, 10),
            block_type: 1,
        });
        assert_eq!(alice_out.drain(), vec![expected.clone()]);
        assert_eq!(bob_out.drain(), vec![expected]);
    }

    #[test]
    fn rejected_block_change_is_not_broadcast() {
        let state = state(4);
        let (alice, alice_out) = peer(0, "alice");
        state.join_world(alice).unwrap();
        assert!(matches!(
            state.apply_block_change(BlockPos::new(256, 0, 0), 1),
            Err(WorldError::OutOfBounds { .. })
        ));
        assert!(alice_out.is_empty());
    }

    #[test]
    fn concurrent_block_changes_arrive_in_one_order() {
        const WRITERS: usize = 4;
        const CHANGES: usize = 500;

        let state = state(4);
        let mut outboxes = Vec::new();
        for (id, name) in ["alice", "bob", "carol"].into_iter().enumerate() {
            let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
            let outbox = Arc::new(Outbox::new(WRITERS * CHANGES + 16));
            let peer = Peer::new(id as i8, name, addr, outbox.clone(), PlayerSnapshot::default());
            state.join_world(peer).unwrap();
            state.dispatcher.promote(id as i8);
            outbox.drain();
            outboxes.push(outbox);
        }

        std::thread::scope(|scope| {
            for writer in 0..WRITERS {
                let state = &state;
                scope.spawn(move || {
                    for i in 0..CHANGES {
                        // Writers share coordinates so the same block is contested.
                        let pos = BlockPos::new((i % 16) as i16, 1, (i % 7) as i16);
                        let block = (writer + 1) as u8;
                        state.apply_block_change(pos, block).unwrap();
                    }
                });
            }
        });

        let seen: Vec<Vec<Packet>> = outboxes.iter().map(|o| o.drain()).collect();
        assert_eq!(seen[0].len(), WRITERS * CHANGES);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0], seen[2]);

        // The world ends with whatever change was broadcast last for each block.
        for x in 0..16 {
            for z in 0..7 {
                let last = seen[0].iter().rev().find_map(|packet| match packet {
                    Packet::SetBlockServer(change)
                        if change.position == BlockPos::new(x, 1, z) =>
                    {
                        Some(change.block_type)
                    }
                    _ => None,
                });
                if let Some(block) = last {
                    assert_eq!(state.block_at(x as i32, 1, z as i32).unwrap(), block);
                }
            }
        }
    }

    #[test]
    fn heartbeat_metadata() {
        let state = state(8);
        let (alice, _out) = peer(0, "alice");
        state.join_world(alice).unwrap();
        assert_eq!(state.heartbeat_info().users, 0);
        state.dispatcher.promote(0);
        let info = state.heartbeat_info();
        assert_eq!(info.users, 1);
        assert_eq!(info.max, 8);
        assert_eq!(info.port, 25565);
        assert_eq!(info.name, "Test Server");
        assert_eq!(info.salt, "0123456789abcdef");
        assert!(info.software.starts_with("classic-rs"));
    }

    #[test]
    fn ids_are_capped_by_max_players() {
        let state = state(2);
        assert_eq!(state.allocate_id().unwrap(), 0);
        assert_eq!(state.allocate_id().unwrap(), 1);
        assert!(state.allocate_id().is_err());
        assert_eq!(state.ids_in_use(), 2);
        assert!(state.release_id(0));
        assert_eq!(state.allocate_id().unwrap(), 0);
    }

    #[tokio::test]
    async fn shutdown_closes_sessions() {
        let state = state(2);
        let (alice, alice_out) = peer(0, "alice");
        state.join_world(alice).unwrap();
        assert!(!state.is_shutting_down());
        state.shutdown("Server shutting down");
        assert!(state.is_shutting_down());
        assert_eq!(
            alice_out.close_reason().as_deref(),
            Some("Server shutting down")
        );
        tokio::time::timeout(Duration::from_secs(1), state.shutdown_signal())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn save_world_writes_snapshot() {
        let dir = std::env::temp_dir().join(format!(
            "classic_rs_state_{}_{}",
            std::process::id(),
            rand::random::<u64>()
        ));
        let storage = WorldStorage::new(dir.join("world.dat"));
        let state = state(2);
        state.apply_block_change(BlockPos::new(1, 2, 3), 5).unwrap();
        state.save_world(&storage).await.unwrap();
        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.get(1, 2, 3).unwrap(), 5);
        let _ = std::fs::remove_dir_all(dir);
    }
}
