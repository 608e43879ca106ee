use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::{
        report::{GameReport, PlayerStats, ProblemStats},
        session::EndReason,
    },
};

/// Public projection of per-problem statistics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProblemStatsDto {
    /// Identifier of the problem.
    pub problem_id: Uuid,
    /// Display name of the problem.
    pub name: String,
    /// Number of contestants who solved it.
    pub solved_count: usize,
    /// Average over contestants of their best pass count.
    pub average_best_passed: f64,
    /// Average number of attempts per contestant.
    pub average_attempts: f64,
}

impl From<&ProblemStats> for ProblemStatsDto {
    fn from(stats: &ProblemStats) -> Self {
        Self {
            problem_id: stats.problem_id,
            name: stats.name.clone(),
            solved_count: stats.solved_count,
            average_best_passed: stats.average_best_passed,
            average_attempts: stats.average_attempts,
        }
    }
}

/// Public projection of per-player statistics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerStatsDto {
    /// Identifier shared with the room user.
    pub user_id: Uuid,
    /// Display name at session creation.
    pub nickname: String,
    /// One '1' or '0' per problem in creation order.
    pub solved_bits: String,
    /// Sum over problems of the best submission's pass count.
    pub total_best_passed: usize,
}

impl From<&PlayerStats> for PlayerStatsDto {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            user_id: stats.user_id,
            nickname: stats.nickname.clone(),
            solved_bits: stats.solved_bits.clone(),
            total_best_passed: stats.total_best_passed,
        }
    }
}

/// Public projection of a finished match's report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameReportDto {
    /// Identifier of the report.
    pub id: Uuid,
    /// Room the match was played in.
    pub room_id: Uuid,
    /// Why the match ended.
    pub end_reason: EndReason,
    /// When the report was created, RFC 3339.
    pub created_at: String,
    /// Configured match duration in seconds.
    pub duration_secs: u64,
    /// Per-problem statistics in creation order.
    pub problems: Vec<ProblemStatsDto>,
    /// Per-contestant statistics in join order.
    pub players: Vec<PlayerStatsDto>,
}

impl From<&GameReport> for GameReportDto {
    fn from(report: &GameReport) -> Self {
        Self {
            id: report.id,
            room_id: report.room_id,
            end_reason: report.end_reason,
            created_at: format_system_time(report.created_at),
            duration_secs: report.duration.as_secs(),
            problems: report.problems.iter().map(Into::into).collect(),
            players: report.players.iter().map(Into::into).collect(),
        }
    }
}
