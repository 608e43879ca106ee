use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{game::GameDto, room::RoomDto};

#[derive(Clone, Debug)]
/// Dispatched payload carried across a room's SSE channel.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the room roster, host, or settings change.
pub struct RoomUpdatedEvent {
    /// Room state after the change.
    pub room: RoomDto,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a match starts, with the initial snapshot.
pub struct GameStartedEvent {
    /// Initial match snapshot.
    pub game: GameDto,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast at each configured "time left" milestone.
pub struct TimeLeftEvent {
    /// Seconds remaining until the end of the match.
    pub seconds_left: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a submission has been graded and recorded.
pub struct SubmissionRecordedEvent {
    /// Player the submission belongs to.
    pub user_id: Uuid,
    /// Index of the attempted problem.
    pub problem_index: usize,
    /// Number of test cases passed.
    pub num_correct: usize,
    /// Total number of graded test cases.
    pub num_test_cases: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Terminal broadcast sent exactly once when the match ends.
pub struct GameEndedEvent {
    /// Final match snapshot, `end_reason` included.
    pub game: GameDto,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the host changed, by transfer or failover.
pub struct HostChangedEvent {
    /// New host; `null` when the room is resting hostless.
    pub host_id: Option<Uuid>,
}
