use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::problem::Difficulty;

/// A user known to a room. Connectivity is tracked through the session token:
/// a user is considered connected exactly when `session_token` is set.
#[derive(Debug, Clone)]
pub struct User {
    /// Stable identifier of the user within the room.
    pub id: Uuid,
    /// Display name chosen by the user.
    pub nickname: String,
    /// Opaque transport token; `Some` while the user holds a live connection.
    pub session_token: Option<String>,
    /// Spectators watch the match without competing.
    pub spectator: bool,
    /// Optional link to a permanent account, used for report attribution.
    pub account_id: Option<Uuid>,
}

impl User {
    /// Build a freshly connected, non-spectating user.
    pub fn new(nickname: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname,
            session_token: Some(Uuid::new_v4().simple().to_string()),
            spectator: false,
            account_id: None,
        }
    }

    /// Whether the user currently holds a live connection.
    pub fn is_connected(&self) -> bool {
        self.session_token.is_some()
    }
}

/// Match parameters configured while the room is still a lobby.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// Requested difficulty for randomly selected problems.
    pub difficulty: Difficulty,
    /// Match duration in seconds.
    pub duration_secs: u64,
    /// Desired number of participants; informational for matchmaking.
    pub size: usize,
    /// Number of problems the match is played over.
    pub num_problems: usize,
    /// Explicit problem selection; when non-empty it overrides random picking.
    pub selected_problems: Vec<Uuid>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Random,
            duration_secs: 900,
            size: 4,
            num_problems: 1,
            selected_problems: Vec::new(),
        }
    }
}

/// Pre-match lobby state. The roster preserves join order, which drives host
/// failover when the current host departs.
#[derive(Debug, Clone)]
pub struct Room {
    /// Stable identifier of the room.
    pub id: Uuid,
    /// Current host, if any. A hostless room is a valid resting state.
    pub host_id: Option<Uuid>,
    /// Users in join order.
    pub users: IndexMap<Uuid, User>,
    /// Match parameters.
    pub settings: RoomSettings,
    /// True while a match for this room is running.
    pub active: bool,
}

impl Room {
    /// Create a room with the given user as its first member and host.
    pub fn new(host: User) -> Self {
        let host_id = host.id;
        let mut users = IndexMap::new();
        users.insert(host_id, host);

        Self {
            id: Uuid::new_v4(),
            host_id: Some(host_id),
            users,
            settings: RoomSettings::default(),
            active: false,
        }
    }

    /// Whether the given user is the current host.
    pub fn is_host(&self, user_id: Uuid) -> bool {
        self.host_id == Some(user_id)
    }
}
