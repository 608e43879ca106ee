use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::{
        problem::{Difficulty, Problem, TestCase},
        session::{EndReason, Player, SessionSnapshot},
    },
};

/// Payload used to start the match for a room. Host-only.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartGameRequest {
    /// User requesting the start.
    pub initiator_id: Uuid,
}

/// Payload used to stop the match early. Host-only.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EndGameRequest {
    /// User requesting the stop.
    pub initiator_id: Uuid,
}

/// Visible test case shown to players as an example.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestCaseDto {
    /// Example input.
    pub input: String,
    /// Expected output for the example.
    pub expected_output: String,
}

impl From<&TestCase> for TestCaseDto {
    fn from(case: &TestCase) -> Self {
        Self {
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
        }
    }
}

/// Player-facing projection of a problem. Hidden test cases are stripped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProblemDto {
    /// Identifier of the problem.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Full statement.
    pub description: String,
    /// Difficulty bucket.
    pub difficulty: Difficulty,
    /// Visible example cases.
    pub visible_cases: Vec<TestCaseDto>,
    /// Total number of graded cases, hidden ones included.
    pub num_test_cases: usize,
}

impl From<&Problem> for ProblemDto {
    fn from(problem: &Problem) -> Self {
        Self {
            id: problem.id,
            name: problem.name.clone(),
            description: problem.description.clone(),
            difficulty: problem.difficulty,
            visible_cases: problem.visible_cases().map(Into::into).collect(),
            num_test_cases: problem.test_cases.len(),
        }
    }
}

/// Public projection of one player's progress.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerDto {
    /// Identifier shared with the room user.
    pub user_id: Uuid,
    /// Display name.
    pub nickname: String,
    /// Connectivity marker as of the last reconciliation.
    pub connected: bool,
    /// Whether the player is a spectator.
    pub spectator: bool,
    /// One solved bit per problem, in problem order.
    pub solved: Vec<bool>,
    /// Total number of attempts across all problems.
    pub num_submissions: usize,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            user_id: player.user_id,
            nickname: player.nickname.clone(),
            connected: player.connected,
            spectator: player.spectator,
            solved: player.solved.clone(),
            num_submissions: player.submissions.len(),
        }
    }
}

/// Public projection of a match, returned by game routes and pushed over SSE.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameDto {
    /// Room the match belongs to.
    pub room_id: Uuid,
    /// Players in join order.
    pub players: Vec<PlayerDto>,
    /// Problems in creation order, hidden cases stripped.
    pub problems: Vec<ProblemDto>,
    /// When the match started, RFC 3339.
    pub started_at: String,
    /// Configured duration in seconds.
    pub duration_secs: u64,
    /// Why the match ended; `null` while it is still running.
    pub end_reason: Option<EndReason>,
}

impl From<&SessionSnapshot> for GameDto {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            room_id: snapshot.room.id,
            players: snapshot.players.values().map(Into::into).collect(),
            problems: snapshot.problems.iter().map(Into::into).collect(),
            started_at: format_system_time(snapshot.started_at),
            duration_secs: snapshot.duration.as_secs(),
            end_reason: snapshot.end_reason,
        }
    }
}
