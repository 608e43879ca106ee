use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::sse::{
        GameEndedEvent, GameStartedEvent, HostChangedEvent, RoomUpdatedEvent, ServerEvent,
        SubmissionRecordedEvent, TimeLeftEvent,
    },
    state::{SharedState, room::Room, session::SessionSnapshot},
};

const EVENT_ROOM_UPDATED: &str = "room.updated";
const EVENT_HOST_CHANGED: &str = "room.host_changed";
const EVENT_GAME_STARTED: &str = "game.started";
const EVENT_TIME_LEFT: &str = "game.time_left";
const EVENT_SUBMISSION_RECORDED: &str = "game.submission";
const EVENT_GAME_ENDED: &str = "game.ended";

/// Broadcast the room state after a roster, host, or settings change.
pub fn broadcast_room_updated(state: &SharedState, room: &Room) {
    let payload = RoomUpdatedEvent { room: room.into() };
    send_room_event(state, room.id, EVENT_ROOM_UPDATED, &payload);
}

/// Broadcast the new host after a transfer or failover.
pub fn broadcast_host_changed(state: &SharedState, room_id: Uuid, host_id: Option<Uuid>) {
    let payload = HostChangedEvent { host_id };
    send_room_event(state, room_id, EVENT_HOST_CHANGED, &payload);
}

/// Broadcast the initial snapshot when a match starts.
pub fn broadcast_game_started(state: &SharedState, snapshot: &SessionSnapshot) {
    let payload = GameStartedEvent {
        game: snapshot.into(),
    };
    send_room_event(state, snapshot.room.id, EVENT_GAME_STARTED, &payload);
}

/// Broadcast a "time left" milestone notification.
pub fn broadcast_time_left(state: &SharedState, room_id: Uuid, seconds_left: u64) {
    let payload = TimeLeftEvent { seconds_left };
    send_room_event(state, room_id, EVENT_TIME_LEFT, &payload);
}

/// Broadcast a freshly recorded submission's outcome.
pub fn broadcast_submission_recorded(
    state: &SharedState,
    room_id: Uuid,
    user_id: Uuid,
    problem_index: usize,
    num_correct: usize,
    num_test_cases: usize,
) {
    let payload = SubmissionRecordedEvent {
        user_id,
        problem_index,
        num_correct,
        num_test_cases,
    };
    send_room_event(state, room_id, EVENT_SUBMISSION_RECORDED, &payload);
}

/// Broadcast the terminal snapshot. Called exactly once per match by the end
/// sequence.
pub fn broadcast_game_ended(state: &SharedState, snapshot: &SessionSnapshot) {
    let payload = GameEndedEvent {
        game: snapshot.into(),
    };
    send_room_event(state, snapshot.room.id, EVENT_GAME_ENDED, &payload);
}

fn send_room_event(state: &SharedState, room_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.broadcaster().publish(room_id, event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
