use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::state::session::EndReason;

/// Per-problem statistics across all contestants.
#[derive(Debug, Clone)]
pub struct ProblemStats {
    /// Identifier of the problem.
    pub problem_id: Uuid,
    /// Display name of the problem.
    pub name: String,
    /// Number of contestants who solved it.
    pub solved_count: usize,
    /// Average over contestants of their best pass count for this problem.
    pub average_best_passed: f64,
    /// Average number of attempts per contestant.
    pub average_attempts: f64,
}

/// Per-player statistics for one match.
#[derive(Debug, Clone)]
pub struct PlayerStats {
    /// Identifier shared with the room user.
    pub user_id: Uuid,
    /// Display name at session creation.
    pub nickname: String,
    /// Linked permanent account, if any.
    pub account_id: Option<Uuid>,
    /// One '1' or '0' per problem in creation order.
    pub solved_bits: String,
    /// Sum over problems of the best submission's pass count.
    pub total_best_passed: usize,
}

/// Post-match statistics record, created at most once per session and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct GameReport {
    /// Identifier of the report.
    pub id: Uuid,
    /// Room the match was played in.
    pub room_id: Uuid,
    /// Why the match ended.
    pub end_reason: EndReason,
    /// When the report was created.
    pub created_at: SystemTime,
    /// Configured match duration.
    pub duration: Duration,
    /// Per-problem statistics in creation order.
    pub problems: Vec<ProblemStats>,
    /// Per-contestant statistics in join order.
    pub players: Vec<PlayerStats>,
}
