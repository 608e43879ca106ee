use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Simple broadcast hub wrapper used for one room's SSE stream.
#[derive(Debug)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Per-room fan-out of push updates to connected clients. Delivery is
/// fire-and-forget and best-effort; nothing in the core waits on it.
#[derive(Debug)]
pub struct Broadcaster {
    hubs: DashMap<Uuid, SseHub>,
    capacity: usize,
}

impl Broadcaster {
    /// Create a broadcaster whose per-room channels hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to the stream for one room, creating its hub on first use.
    pub fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.hubs
            .entry(room_id)
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Publish an event to every subscriber of the room's stream.
    pub fn publish(&self, room_id: Uuid, event: ServerEvent) {
        if let Some(hub) = self.hubs.get(&room_id) {
            hub.broadcast(event);
        }
    }

    /// Drop the hub for a deleted room, disconnecting its subscribers.
    pub fn drop_room(&self, room_id: Uuid) {
        self.hubs.remove(&room_id);
    }
}
