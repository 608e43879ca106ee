use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::room::{
        ChangeHostRequest, ConnectionUpdateRequest, CreateRoomRequest, JoinRoomRequest,
        LeaveRoomRequest, RoomDto, RoomMembership, UpdateSettingsRequest,
    },
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes handling the lobby lifecycle: creation, membership, host role, and
/// settings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/{id}/leave", post(leave_room))
        .route("/rooms/{id}/host", put(change_host))
        .route("/rooms/{id}/connection", put(update_connection))
        .route("/rooms/{id}/settings", put(update_settings))
}

#[utoipa::path(
    post,
    path = "/rooms",
    tag = "room",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomMembership)
    )
)]
/// Open a new room with the requesting user as host.
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<RoomMembership>, AppError> {
    payload.validate()?;
    let membership = room_service::create_room(&state, payload).await?;
    Ok(Json(membership))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "room",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Room state", body = RoomDto),
        (status = 404, description = "Room not found")
    )
)]
/// Fetch a room's public state.
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomDto>, AppError> {
    let room = room_service::get_room(&state, id).await?;
    Ok(Json(room))
}

#[utoipa::path(
    post,
    path = "/rooms/{id}/join",
    tag = "room",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined the room", body = RoomMembership),
        (status = 404, description = "Room not found")
    )
)]
/// Join an existing room as a contestant or spectator.
pub async fn join_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<RoomMembership>, AppError> {
    payload.validate()?;
    let membership = room_service::join_room(&state, id, payload).await?;
    Ok(Json(membership))
}

#[utoipa::path(
    post,
    path = "/rooms/{id}/leave",
    tag = "room",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = LeaveRoomRequest,
    responses(
        (status = 200, description = "Left the room; `null` when the room was deleted", body = Option<RoomDto>),
        (status = 404, description = "Room or user not found")
    )
)]
/// Leave a room. The last leaver deletes it.
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeaveRoomRequest>,
) -> Result<Json<Option<RoomDto>>, AppError> {
    let remaining = room_service::leave_room(&state, id, payload).await?;
    Ok(Json(remaining))
}

#[utoipa::path(
    put,
    path = "/rooms/{id}/host",
    tag = "room",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = ChangeHostRequest,
    responses(
        (status = 200, description = "Host transferred", body = RoomDto),
        (status = 401, description = "Initiator is not the host"),
        (status = 404, description = "Room or target user not found")
    )
)]
/// Transfer the host role to another connected user.
pub async fn change_host(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeHostRequest>,
) -> Result<Json<RoomDto>, AppError> {
    let room = room_service::change_host(&state, id, payload).await?;
    Ok(Json(room))
}

#[utoipa::path(
    put,
    path = "/rooms/{id}/connection",
    tag = "room",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = ConnectionUpdateRequest,
    responses(
        (status = 200, description = "Connection state recorded", body = RoomDto),
        (status = 404, description = "Room or user not found")
    )
)]
/// Record a connectivity change for one user, with host failover.
pub async fn update_connection(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConnectionUpdateRequest>,
) -> Result<Json<RoomDto>, AppError> {
    let room = room_service::update_connection(&state, id, payload).await?;
    Ok(Json(room))
}

#[utoipa::path(
    put,
    path = "/rooms/{id}/settings",
    tag = "room",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = RoomDto),
        (status = 401, description = "Initiator is not the host"),
        (status = 409, description = "A match is currently running")
    )
)]
/// Update the room's match settings while it is still a lobby.
pub async fn update_settings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<RoomDto>, AppError> {
    payload.validate()?;
    let room = room_service::update_settings(&state, id, payload).await?;
    Ok(Json(room))
}
