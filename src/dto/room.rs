use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::validate_nickname,
    state::{
        problem::Difficulty,
        room::{Room, RoomSettings, User},
    },
};

/// Payload used to open a brand-new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Nickname of the creating user, who becomes the host.
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Nickname of the joining user.
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
    /// Join as a spectator instead of a contestant.
    #[serde(default)]
    pub spectator: bool,
    /// Optional permanent account to attribute reports to.
    #[serde(default)]
    pub account_id: Option<Uuid>,
}

/// Payload used to leave a room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveRoomRequest {
    /// User leaving the room.
    pub user_id: Uuid,
}

/// Payload for an explicit host transfer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeHostRequest {
    /// Current host requesting the transfer.
    pub initiator_id: Uuid,
    /// User to promote.
    pub new_host_id: Uuid,
}

/// Payload reporting a connectivity change for one user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectionUpdateRequest {
    /// User whose connection state changed.
    pub user_id: Uuid,
    /// Whether the user is now connected.
    pub connected: bool,
}

/// Payload updating the room's match settings. Host-only.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateSettingsRequest {
    /// User requesting the update.
    pub initiator_id: Uuid,
    /// Requested difficulty for random problem selection.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Match duration in seconds.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub duration_secs: Option<u64>,
    /// Number of problems the match is played over.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub num_problems: Option<usize>,
    /// Desired room size.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub size: Option<usize>,
    /// Explicit problem selection overriding random picking.
    #[serde(default)]
    pub selected_problems: Option<Vec<Uuid>>,
}

/// Public projection of a room user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDto {
    /// Identifier of the user.
    pub id: Uuid,
    /// Display name.
    pub nickname: String,
    /// Whether the user currently holds a live connection.
    pub connected: bool,
    /// Whether the user is a spectator.
    pub spectator: bool,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname.clone(),
            connected: user.is_connected(),
            spectator: user.spectator,
        }
    }
}

/// Public projection of the room's match settings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingsDto {
    /// Requested difficulty.
    pub difficulty: Difficulty,
    /// Match duration in seconds.
    pub duration_secs: u64,
    /// Desired room size.
    pub size: usize,
    /// Number of problems per match.
    pub num_problems: usize,
    /// Explicit problem selection, empty when random picking is used.
    pub selected_problems: Vec<Uuid>,
}

impl From<&RoomSettings> for SettingsDto {
    fn from(settings: &RoomSettings) -> Self {
        Self {
            difficulty: settings.difficulty,
            duration_secs: settings.duration_secs,
            size: settings.size,
            num_problems: settings.num_problems,
            selected_problems: settings.selected_problems.clone(),
        }
    }
}

/// Public projection of a room, returned by lobby routes and pushed over SSE.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomDto {
    /// Identifier of the room.
    pub id: Uuid,
    /// Current host, if any.
    pub host_id: Option<Uuid>,
    /// Users in join order.
    pub users: Vec<UserDto>,
    /// Match settings.
    pub settings: SettingsDto,
    /// Whether a match is currently running.
    pub active: bool,
}

impl From<&Room> for RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            host_id: room.host_id,
            users: room.users.values().map(Into::into).collect(),
            settings: (&room.settings).into(),
            active: room.active,
        }
    }
}

/// Response returned when a user is created inside a room (create or join).
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomMembership {
    /// Identifier of the newly created user.
    pub user_id: Uuid,
    /// Transport token proving the connection.
    pub session_token: String,
    /// Room state after the change.
    pub room: RoomDto,
}
