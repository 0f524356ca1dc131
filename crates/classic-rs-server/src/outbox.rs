//! Bounded per-session outbound queue.
//!
//! Broadcasts never wait on a socket: they push here and wake the owning
//! session, which drains the queue into its writer. When the queue is full,
//! movement and keep-alive packets make way first. A reliable packet (block
//! change, chat, spawn, despawn) that still does not fit closes the outbox,
//! which disconnects the session instead of stalling the broadcaster.

use std::collections::VecDeque;

use classic_rs_proto::Packet;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};

/// Disconnect reason used when a session cannot keep up.
pub const OVERFLOW_REASON: &str = "Too slow to keep up";

/// What happened to a pushed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Replaced a queued movement update for the same player.
    Coalesced,
    /// Queued after evicting the oldest droppable packet.
    Evicted,
    /// The queue was full of reliable packets; the new droppable packet was discarded.
    Dropped,
    /// A reliable packet did not fit; the outbox is now closed.
    Overflow,
    /// The outbox was already closed.
    Closed,
}

fn is_droppable(packet: &Packet) -> bool {
    matches!(packet, Packet::PositionOrientation(_) | Packet::Ping)
}

pub struct Outbox {
    queue: Mutex<VecDeque<Packet>>,
    capacity: usize,
    notify: Notify,
    closed: watch::Sender<Option<String>>,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        let (closed, _) = watch::channel(None);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
            notify: Notify::new(),
            closed,
        }
    }

    /// Queue a packet for the session and wake it.
    pub fn push(&self, packet: Packet) -> PushOutcome {
        let outcome = {
            let mut queue = self.queue.lock();
            if self.is_closed() {
                return PushOutcome::Closed;
            }
            match self.enqueue(&mut queue, packet) {
                Some(outcome) => outcome,
                None => {
                    queue.clear();
                    drop(queue);
                    self.close(OVERFLOW_REASON);
                    return PushOutcome::Overflow;
                }
            }
        };
        if outcome != PushOutcome::Dropped {
            self.notify.notify_one();
        }
        outcome
    }

    /// `None` means a reliable packet could not be queued.
    fn enqueue(&self, queue: &mut VecDeque<Packet>, packet: Packet) -> Option<PushOutcome> {
        if let Packet::PositionOrientation(update) = &packet {
            let queued = queue.iter_mut().find(|queued| {
                matches!(queued, Packet::PositionOrientation(q) if q.player_id == update.player_id)
            });
            if let Some(slot) = queued {
                *slot = packet;
                return Some(PushOutcome::Coalesced);
            }
        }

        if queue.len() < self.capacity {
            queue.push_back(packet);
            return Some(PushOutcome::Queued);
        }

        match queue.iter().position(is_droppable) {
            Some(oldest) => {
                queue.remove(oldest);
                queue.push_back(packet);
                Some(PushOutcome::Evicted)
            }
            None if is_droppable(&packet) => Some(PushOutcome::Dropped),
            None => None,
        }
    }

    /// Take everything queued, oldest first.
    pub fn drain(&self) -> Vec<Packet> {
        self.queue.lock().drain(..).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until something is pushed.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Close the outbox with a disconnect reason. Only the first call has any
    /// effect; it discards queued packets and returns `true`.
    pub fn close(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let closed = self.closed.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        });
        if closed {
            self.queue.lock().clear();
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.closed.borrow().is_some()
    }

    pub fn close_reason(&self) -> Option<String> {
        self.closed.borrow().clone()
    }

    /// Resolve with the close reason once the outbox is closed.
    pub async fn closed(&self) -> String {
        let mut rx = self.closed.subscribe();
        let signalled = rx.wait_for(Option::is_some).await.is_ok();
        if !signalled {
            // The sender lives as long as `self`.
            std::future::pending::<()>().await;
        }
        let reason = rx.borrow().clone();
        reason.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classic_rs_proto::packets::{Message, PositionOrientation, SetBlockServer};
    use classic_rs_proto::types::{BlockPos, Position};
    use std::time::Duration;

    fn movement(player_id: i8, x: i16) -> Packet {
        Packet::PositionOrientation(PositionOrientation {
            player_id,
            position: Position::new(x, 0, 0),
            yaw: 0,
            pitch: 0,
        })
    }

    fn block(x: i16) -> Packet {
        Packet::SetBlockServer(SetBlockServer {
            position: BlockPos::new(x, 0, 0),
            block_type: 1,
        })
    }

    #[test]
    fn movement_for_same_player_is_coalesced() {
        let outbox = Outbox::new(8);
        assert_eq!(outbox.push(movement(1, 10)), PushOutcome::Queued);
        assert_eq!(outbox.push(block(0)), PushOutcome::Queued);
        assert_eq!(outbox.push(movement(2, 20)), PushOutcome::Queued);
        assert_eq!(outbox.push(movement(1, 11)), PushOutcome::Coalesced);
        assert_eq!(
            outbox.drain(),
            vec![movement(1, 11), block(0), movement(2, 20)]
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn full_queue_evicts_oldest_movement() {
        let outbox = Outbox::new(3);
        outbox.push(block(0));
        outbox.push(movement(1, 0));
        outbox.push(movement(2, 0));
        assert_eq!(outbox.push(block(1)), PushOutcome::Evicted);
        assert_eq!(outbox.drain(), vec![block(0), movement(2, 0), block(1)]);
    }

    #[test]
    fn full_queue_drops_new_movement_when_nothing_is_droppable() {
        let outbox = Outbox::new(2);
        outbox.push(block(0));
        outbox.push(block(1));
        assert_eq!(outbox.push(movement(1, 0)), PushOutcome::Dropped);
        assert_eq!(outbox.push(Packet::Ping), PushOutcome::Dropped);
        assert!(!outbox.is_closed());
        assert_eq!(outbox.drain(), vec![block(0), block(1)]);
    }

    #[test]
    fn reliable_overflow_closes() {
        let outbox = Outbox::new(2);
        outbox.push(block(0));
        outbox.push(block(1));
        assert_eq!(
            outbox.push(Packet::Message(Message::system("hi"))),
            PushOutcome::Overflow
        );
        assert!(outbox.is_closed());
        assert_eq!(outbox.close_reason().as_deref(), Some(OVERFLOW_REASON));
        assert!(outbox.is_empty());
        assert_eq!(outbox.push(block(2)), PushOutcome::Closed);
    }

    #[test]
    fn close_is_idempotent() {
        let outbox = Outbox::new(4);
        outbox.push(block(0));
        assert!(outbox.close("Kicked"));
        assert!(!outbox.close("Again"));
        assert_eq!(outbox.close_reason().as_deref(), Some("Kicked"));
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn push_wakes_waiter() {
        let outbox = std::sync::Arc::new(Outbox::new(4));
        let waiter = {
            let outbox = outbox.clone();
            tokio::spawn(async move {
                outbox.notified().await;
                outbox.drain()
            })
        };
        tokio::task::yield_now().await;
        outbox.push(block(7));
        let drained = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(drained, vec![block(7)]);
    }

    #[tokio::test]
    async fn closed_resolves_with_reason() {
        let outbox = std::sync::Arc::new(Outbox::new(4));
        let waiter = {
            let outbox = outbox.clone();
            tokio::spawn(async move { outbox.closed().await })
        };
        tokio::task::yield_now().await;
        outbox.close("Server shutting down");
        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, "Server shutting down");
        // Already closed: resolves immediately.
        assert_eq!(outbox.closed().await, "Server shutting down");
    }
}
