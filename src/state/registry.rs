use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::state::session::GameSession;

/// A session behind its per-session mutex. Every mutating operation against
/// one match (submissions, manual end, connectivity reconciliation, timer
/// callbacks) is serialized through this lock.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Owns the mapping from room id to its active session.
///
/// Entries are independent: operations on one session never contend with
/// another, and the map itself is only touched to insert, look up, or remove
/// whole sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SharedSession>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under the room id, returning the shared handle and
    /// any prior session for that id so the caller can tear its timers down.
    pub fn insert(
        &self,
        room_id: Uuid,
        session: GameSession,
    ) -> (SharedSession, Option<SharedSession>) {
        let shared = Arc::new(Mutex::new(session));
        let prior = self.sessions.insert(room_id, Arc::clone(&shared));
        (shared, prior)
    }

    /// Look up the active session for a room.
    pub fn get(&self, room_id: Uuid) -> Option<SharedSession> {
        self.sessions.get(&room_id).map(|entry| Arc::clone(&entry))
    }

    /// Deregister and return the session for a room, if present.
    pub fn remove(&self, room_id: Uuid) -> Option<SharedSession> {
        self.sessions.remove(&room_id).map(|(_, session)| session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{problem::Problem, room::{Room, User}};

    fn session() -> GameSession {
        GameSession::new(Room::new(User::new("ada".into())), Vec::<Problem>::new())
    }

    #[test]
    fn insert_replaces_prior_session_for_the_same_room() {
        let registry = SessionRegistry::new();
        let room_id = Uuid::new_v4();

        let (_, prior) = registry.insert(room_id, session());
        assert!(prior.is_none());
        let (_, prior) = registry.insert(room_id, session());
        assert!(prior.is_some());
        assert!(registry.get(room_id).is_some());
    }

    #[test]
    fn get_and_remove_missing_room() {
        let registry = SessionRegistry::new();
        let room_id = Uuid::new_v4();

        assert!(registry.get(room_id).is_none());
        assert!(registry.remove(room_id).is_none());
    }
}
