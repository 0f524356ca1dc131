//! Broadcast Dispatcher: fans events out to the sessions' outboxes.
//!
//! A registered peer starts out `Loading` (it receives block changes so that
//! nothing accepted while its level streams is lost) and becomes `Playing`
//! once the level is finalized. Player-level events (spawn, movement, chat,
//! despawn) only ever reach `Playing` peers.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use classic_rs_proto::packets::{DespawnPlayer, Message, PositionOrientation, SpawnPlayer};
use classic_rs_proto::types::Position;
use classic_rs_proto::Packet;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::outbox::{Outbox, PushOutcome};

/// Last known position and orientation of a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub position: Position,
    pub yaw: u8,
    pub pitch: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStage {
    /// Level data is still streaming.
    Loading,
    /// Spawned and visible to others.
    Playing,
}

/// A session as seen by the dispatcher.
pub struct Peer {
    pub id: i8,
    pub name: String,
    pub addr: SocketAddr,
    pub outbox: Arc<Outbox>,
    stage: PeerStage,
    snapshot: Mutex<PlayerSnapshot>,
}

impl Peer {
    pub fn new(
        id: i8,
        name: impl Into<String>,
        addr: SocketAddr,
        outbox: Arc<Outbox>,
        snapshot: PlayerSnapshot,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            addr,
            outbox,
            stage: PeerStage::Loading,
            snapshot: Mutex::new(snapshot),
        }
    }

    fn spawn_packet(&self) -> Packet {
        let snapshot = *self.snapshot.lock();
        Packet::SpawnPlayer(SpawnPlayer {
            player_id: self.id,
            name: self.name.clone(),
            position: snapshot.position,
            yaw: snapshot.yaw,
            pitch: snapshot.pitch,
        })
    }

    fn deliver(&self, packet: Packet) -> PushOutcome {
        let outcome = self.outbox.push(packet);
        match outcome {
            PushOutcome::Overflow => {
                warn!(
                    "{} ({}) cannot keep up with broadcasts, disconnecting",
                    self.name, self.addr
                );
            }
            PushOutcome::Dropped => debug!("Dropped stale update for {}", self.name),
            _ => {}
        }
        outcome
    }
}

/// Registry of peers keyed by player id.
#[derive(Default)]
pub struct Dispatcher {
    peers: RwLock<BTreeMap<i8, Peer>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer in the `Loading` stage. Names are unique, ignoring case.
    pub fn register(&self, peer: Peer) -> Result<(), AuthError> {
        let mut peers = self.peers.write();
        if peers
            .values()
            .any(|p| p.name.eq_ignore_ascii_case(&peer.name))
        {
            return Err(AuthError::AlreadyOnline(peer.name));
        }
        peers.insert(peer.id, peer);
        Ok(())
    }

    /// Move a loading peer into the world.
    ///
    /// The peer receives its own spawn followed by every player already in
    /// the world, and everyone else receives its spawn.
    pub fn promote(&self, id: i8) -> bool {
        let mut peers = self.peers.write();
        let Some(joining) = peers.get(&id) else {
            return false;
        };
        if joining.stage == PeerStage::Playing {
            return false;
        }

        let own_spawn = joining.spawn_packet();
        joining.deliver(own_spawn.clone());
        for other in peers
            .values()
            .filter(|p| p.id != id && p.stage == PeerStage::Playing)
        {
            joining.deliver(other.spawn_packet());
            other.deliver(own_spawn.clone());
        }

        if let Some(joining) = peers.get_mut(&id) {
            joining.stage = PeerStage::Playing;
        }
        true
    }

    /// Remove a peer. If it was playing, everyone else sees it despawn and
    /// receives `quit_notice`.
    pub fn unregister(&self, id: i8, quit_notice: Option<&str>) -> Option<Peer> {
        let mut peers = self.peers.write();
        let peer = peers.remove(&id)?;
        if peer.stage == PeerStage::Playing {
            for other in peers.values().filter(|p| p.stage == PeerStage::Playing) {
                other.deliver(Packet::DespawnPlayer(DespawnPlayer { player_id: id }));
                if let Some(notice) = quit_notice {
                    other.deliver(Packet::Message(Message::system(notice)));
                }
            }
        }
        Some(peer)
    }

    /// Send to every playing peer.
    pub fn broadcast(&self, packet: Packet) {
        let peers = self.peers.read();
        for peer in peers.values().filter(|p| p.stage == PeerStage::Playing) {
            peer.deliver(packet.clone());
        }
    }

    /// Send a world change to every registered peer, loading or playing.
    pub fn broadcast_world(&self, packet: Packet) {
        let peers = self.peers.read();
        for peer in peers.values() {
            peer.deliver(packet.clone());
        }
    }

    /// Record a player's movement and forward it to everyone else.
    pub fn update_position(&self, id: i8, snapshot: PlayerSnapshot) {
        let peers = self.peers.read();
        let Some(mover) = peers.get(&id) else {
            return;
        };
        *mover.snapshot.lock() = snapshot;
        if mover.stage != PeerStage::Playing {
            return;
        }
        let update = Packet::PositionOrientation(PositionOrientation {
            player_id: id,
            position: snapshot.position,
            yaw: snapshot.yaw,
            pitch: snapshot.pitch,
        });
        for peer in peers
            .values()
            .filter(|p| p.id != id && p.stage == PeerStage::Playing)
        {
            peer.deliver(update.clone());
        }
    }

    /// Send to one peer by id.
    pub fn send_to(&self, id: i8, packet: Packet) -> Option<PushOutcome> {
        self.peers.read().get(&id).map(|peer| peer.deliver(packet))
    }

    /// Look up an online player by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<(i8, String, Arc<Outbox>)> {
        self.peers
            .read()
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| (p.id, p.name.clone(), p.outbox.clone()))
    }

    /// Close a player's session with a disconnect reason.
    pub fn kick(&self, name: &str, reason: &str) -> bool {
        match self.find(name) {
            Some((_, _, outbox)) => outbox.close(reason),
            None => false,
        }
    }

    /// Names of playing peers, by id.
    pub fn online(&self) -> Vec<(i8, String)> {
        self.peers
            .read()
            .values()
            .filter(|p| p.stage == PeerStage::Playing)
            .map(|p| (p.id, p.name.clone()))
            .collect()
    }

    pub fn playing_count(&self) -> usize {
        self.peers
            .read()
            .values()
            .filter(|p| p.stage == PeerStage::Playing)
            .count()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close every registered session.
    pub fn close_all(&self, reason: &str) {
        for peer in self.peers.read().values() {
            peer.outbox.close(reason);
        }
    }
}
