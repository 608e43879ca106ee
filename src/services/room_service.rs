use uuid::Uuid;

use crate::{
    dto::room::{
        ChangeHostRequest, ConnectionUpdateRequest, CreateRoomRequest, JoinRoomRequest,
        LeaveRoomRequest, RoomDto, RoomMembership, UpdateSettingsRequest,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        room::{Room, User},
    },
};

/// Open a new room with the requesting user as host.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomMembership, ServiceError> {
    let host = User::new(request.nickname);
    let user_id = host.id;
    let session_token = host
        .session_token
        .clone()
        .unwrap_or_default();

    let room = Room::new(host);
    let dto = RoomDto::from(&room);
    state.rooms().insert(room.id, room);

    Ok(RoomMembership {
        user_id,
        session_token,
        room: dto,
    })
}

/// Look up a room's public state.
pub async fn get_room(state: &SharedState, room_id: Uuid) -> Result<RoomDto, ServiceError> {
    state
        .rooms()
        .get(&room_id)
        .map(|room| RoomDto::from(&*room))
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))
}

/// Add a user to an existing room. Users joining after a match started watch
/// from the lobby; they do not become players of the running match.
pub async fn join_room(
    state: &SharedState,
    room_id: Uuid,
    request: JoinRoomRequest,
) -> Result<RoomMembership, ServiceError> {
    let mut user = User::new(request.nickname);
    user.spectator = request.spectator;
    user.account_id = request.account_id;
    let user_id = user.id;
    let session_token = user.session_token.clone().unwrap_or_default();

    let room_state = {
        let mut room = state
            .rooms()
            .get_mut(&room_id)
            .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
        room.users.insert(user_id, user);
        room.clone()
    };

    sse_events::broadcast_room_updated(state, &room_state);

    Ok(RoomMembership {
        user_id,
        session_token,
        room: RoomDto::from(&room_state),
    })
}

enum LeaveOutcome {
    Deleted,
    Updated {
        room: Room,
        host_change: Option<Option<Uuid>>,
    },
}

/// Remove a user from a room. The last leaver deletes the room along with its
/// session and push channel; removing the current host promotes the next
/// connected user in join order.
pub async fn leave_room(
    state: &SharedState,
    room_id: Uuid,
    request: LeaveRoomRequest,
) -> Result<Option<RoomDto>, ServiceError> {
    let user_id = request.user_id;

    let outcome = {
        let mut room = state
            .rooms()
            .get_mut(&room_id)
            .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;

        if room.users.shift_remove(&user_id).is_none() {
            return Err(ServiceError::NotFound(format!(
                "user `{user_id}` is not in room `{room_id}`"
            )));
        }

        if room.users.is_empty() {
            LeaveOutcome::Deleted
        } else {
            let host_change = if room.host_id == Some(user_id) {
                Some(promote_next_host(&mut room, user_id))
            } else {
                None
            };
            LeaveOutcome::Updated {
                room: room.clone(),
                host_change,
            }
        }
    };

    match outcome {
        LeaveOutcome::Deleted => {
            state.rooms().remove(&room_id);
            if let Some(session) = state.sessions().remove(room_id) {
                session.lock().await.timers.cancel_all();
            }
            state.broadcaster().drop_room(room_id);
            Ok(None)
        }
        LeaveOutcome::Updated { room, host_change } => {
            if let Some(session) = state.sessions().get(room_id) {
                session.lock().await.reconcile_connectivity(user_id, false);
            }
            sse_events::broadcast_room_updated(state, &room);
            if let Some(new_host) = host_change {
                sse_events::broadcast_host_changed(state, room_id, new_host);
            }
            Ok(Some(RoomDto::from(&room)))
        }
    }
}

/// Explicit host transfer, initiated by the current host.
pub async fn change_host(
    state: &SharedState,
    room_id: Uuid,
    request: ChangeHostRequest,
) -> Result<RoomDto, ServiceError> {
    let room_state = {
        let mut room = state
            .rooms()
            .get_mut(&room_id)
            .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;

        if !room.is_host(request.initiator_id) {
            return Err(ServiceError::Unauthorized(
                "only the host can transfer the host role".into(),
            ));
        }

        let target = room.users.get(&request.new_host_id).ok_or_else(|| {
            ServiceError::NotFound(format!(
                "user `{}` is not in room `{room_id}`",
                request.new_host_id
            ))
        })?;
        if !target.is_connected() {
            return Err(ServiceError::InvalidInput(
                "cannot promote a disconnected user to host".into(),
            ));
        }

        room.host_id = Some(request.new_host_id);
        room.clone()
    };

    sse_events::broadcast_host_changed(state, room_id, Some(request.new_host_id));
    sse_events::broadcast_room_updated(state, &room_state);
    Ok(RoomDto::from(&room_state))
}

/// Update match settings while the room is still a lobby. Host-only.
pub async fn update_settings(
    state: &SharedState,
    room_id: Uuid,
    request: UpdateSettingsRequest,
) -> Result<RoomDto, ServiceError> {
    let room_state = {
        let mut room = state
            .rooms()
            .get_mut(&room_id)
            .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;

        if !room.is_host(request.initiator_id) {
            return Err(ServiceError::Unauthorized(
                "only the host can change room settings".into(),
            ));
        }
        if room.active {
            return Err(ServiceError::InvalidState(
                "settings cannot change while a match is running".into(),
            ));
        }

        if let Some(difficulty) = request.difficulty {
            room.settings.difficulty = difficulty;
        }
        if let Some(duration_secs) = request.duration_secs {
            room.settings.duration_secs = duration_secs;
        }
        if let Some(num_problems) = request.num_problems {
            room.settings.num_problems = num_problems;
        }
        if let Some(size) = request.size {
            room.settings.size = size;
        }
        if let Some(selected) = request.selected_problems {
            room.settings.selected_problems = selected;
        }

        room.clone()
    };

    sse_events::broadcast_room_updated(state, &room_state);
    Ok(RoomDto::from(&room_state))
}

/// Record a connectivity change for one user, running host failover when the
/// host dropped and filling the host seat when a hostless room sees a user
/// come back.
pub async fn update_connection(
    state: &SharedState,
    room_id: Uuid,
    request: ConnectionUpdateRequest,
) -> Result<RoomDto, ServiceError> {
    let user_id = request.user_id;

    let (room_state, host_change) = {
        let mut room = state
            .rooms()
            .get_mut(&room_id)
            .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;

        let user = room.users.get_mut(&user_id).ok_or_else(|| {
            ServiceError::NotFound(format!("user `{user_id}` is not in room `{room_id}`"))
        })?;

        user.session_token = request
            .connected
            .then(|| Uuid::new_v4().simple().to_string());

        let host_change = if !request.connected && room.is_host(user_id) {
            Some(promote_next_host(&mut room, user_id))
        } else if request.connected && room.host_id.is_none() {
            room.host_id = Some(user_id);
            Some(Some(user_id))
        } else {
            None
        };

        (room.clone(), host_change)
    };

    // Refresh the session's value copy at this explicit reconciliation point.
    if let Some(session) = state.sessions().get(room_id) {
        session
            .lock()
            .await
            .reconcile_connectivity(user_id, request.connected);
    }

    sse_events::broadcast_room_updated(state, &room_state);
    if let Some(new_host) = host_change {
        sse_events::broadcast_host_changed(state, room_id, new_host);
    }
    Ok(RoomDto::from(&room_state))
}

/// Pick a replacement host: the first user in join order, other than the
/// departing one, whose connectivity marker is set. When nobody qualifies the
/// room is left hostless, a valid resting state.
fn promote_next_host(room: &mut Room, departing: Uuid) -> Option<Uuid> {
    let next = room
        .users
        .values()
        .find(|user| user.id != departing && user.is_connected())
        .map(|user| user.id);
    room.host_id = next;
    next
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        catalog::InMemoryCatalog,
        config::AppConfig,
        dao::{accounts::InMemoryAccountStore, reports::InMemoryReportStore},
        judge::offline::OfflineJudge,
        state::AppState,
    };

    fn test_state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            Arc::new(InMemoryCatalog::default()),
            Arc::new(OfflineJudge),
            Arc::new(InMemoryAccountStore::default()),
            Arc::new(InMemoryReportStore::default()),
        )
    }

    async fn room_with_three_users(state: &SharedState) -> (Uuid, Uuid, Uuid, Uuid) {
        let created = create_room(
            state,
            CreateRoomRequest {
                nickname: "a".into(),
            },
        )
        .await
        .unwrap();
        let room_id = created.room.id;
        let a = created.user_id;

        let b = join_room(
            state,
            room_id,
            JoinRoomRequest {
                nickname: "b".into(),
                spectator: false,
                account_id: None,
            },
        )
        .await
        .unwrap()
        .user_id;
        let c = join_room(
            state,
            room_id,
            JoinRoomRequest {
                nickname: "c".into(),
                spectator: false,
                account_id: None,
            },
        )
        .await
        .unwrap()
        .user_id;

        (room_id, a, b, c)
    }

    async fn disconnect(state: &SharedState, room_id: Uuid, user_id: Uuid) -> RoomDto {
        update_connection(
            state,
            room_id,
            ConnectionUpdateRequest {
                user_id,
                connected: false,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn host_failover_follows_join_order() {
        let state = test_state();
        let (room_id, a, b, c) = room_with_three_users(&state).await;

        // B drops first, then the host: the next connected user in join
        // order after A is C.
        disconnect(&state, room_id, b).await;
        let room = disconnect(&state, room_id, a).await;

        assert_eq!(room.host_id, Some(c));
    }

    #[tokio::test]
    async fn room_rests_hostless_when_nobody_is_connected() {
        let state = test_state();
        let (room_id, a, b, c) = room_with_three_users(&state).await;

        disconnect(&state, room_id, b).await;
        disconnect(&state, room_id, c).await;
        let room = leave_room(&state, room_id, LeaveRoomRequest { user_id: a })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(room.host_id, None);
        assert_eq!(room.users.len(), 2);
    }

    #[tokio::test]
    async fn reconnecting_into_a_hostless_room_takes_the_host_seat() {
        let state = test_state();
        let (room_id, a, b, c) = room_with_three_users(&state).await;

        disconnect(&state, room_id, b).await;
        disconnect(&state, room_id, c).await;
        let room = disconnect(&state, room_id, a).await;
        assert_eq!(room.host_id, None);

        let room = update_connection(
            &state,
            room_id,
            ConnectionUpdateRequest {
                user_id: b,
                connected: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(room.host_id, Some(b));
    }

    #[tokio::test]
    async fn last_leaver_deletes_the_room() {
        let state = test_state();
        let created = create_room(
            &state,
            CreateRoomRequest {
                nickname: "solo".into(),
            },
        )
        .await
        .unwrap();
        let room_id = created.room.id;

        let remaining = leave_room(
            &state,
            room_id,
            LeaveRoomRequest {
                user_id: created.user_id,
            },
        )
        .await
        .unwrap();

        assert!(remaining.is_none());
        assert!(matches!(
            get_room(&state, room_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_the_host_may_transfer_the_role() {
        let state = test_state();
        let (room_id, _a, b, c) = room_with_three_users(&state).await;

        let err = change_host(
            &state,
            room_id,
            ChangeHostRequest {
                initiator_id: b,
                new_host_id: c,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn transfer_to_a_disconnected_user_is_rejected() {
        let state = test_state();
        let (room_id, a, b, _c) = room_with_three_users(&state).await;

        disconnect(&state, room_id, b).await;
        let err = change_host(
            &state,
            room_id,
            ChangeHostRequest {
                initiator_id: a,
                new_host_id: b,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
