use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    judge::CaseResult,
    state::{problem::Problem, room::Room, timer::TimerHandle},
};

/// Why a match ended. When several conditions become true near-simultaneously
/// the reported reason follows the fixed priority ManualEnd > AllSolved >
/// TimeUp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    /// The host stopped the match.
    ManualEnd,
    /// Every contestant solved every problem.
    AllSolved,
    /// The end-of-match timer fired.
    TimeUp,
}

/// One graded attempt, immutable once appended to a player's history.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Index of the attempted problem within the session's problem list.
    pub problem_index: usize,
    /// Submitted source code.
    pub code: String,
    /// Language the code was graded as.
    pub language: String,
    /// Per-test-case outcomes reported by the judge.
    pub results: Vec<CaseResult>,
    /// Number of test cases passed.
    pub num_correct: usize,
    /// Total number of graded test cases.
    pub num_test_cases: usize,
    /// Runtime reported by the judge, when available.
    pub runtime_ms: Option<f64>,
    /// Compiler output when the code failed to build.
    pub compilation_error: Option<String>,
    /// When the attempt was recorded.
    pub submitted_at: SystemTime,
}

impl Submission {
    /// Whether every test case passed.
    pub fn is_full_marks(&self) -> bool {
        self.num_test_cases > 0 && self.num_correct == self.num_test_cases
    }
}

/// A user's in-session record: a value copy of the relevant user fields plus
/// per-match progress. Not a live alias into the room roster; connectivity is
/// refreshed only at explicit reconciliation points.
#[derive(Debug, Clone)]
pub struct Player {
    /// Identifier shared with the room user this player was built from.
    pub user_id: Uuid,
    /// Display name at session creation.
    pub nickname: String,
    /// Connectivity marker as of the last reconciliation.
    pub connected: bool,
    /// Spectators are excluded from the all-solved condition.
    pub spectator: bool,
    /// Linked permanent account, if any.
    pub account_id: Option<Uuid>,
    /// Attempts in arrival order, never overwritten.
    pub submissions: Vec<Submission>,
    /// One solved bit per problem, in problem order.
    pub solved: Vec<bool>,
}

impl Player {
    /// Build a player from a room user, sizing the solved bitset to the
    /// session's problem count.
    pub fn from_user(user: &crate::state::room::User, num_problems: usize) -> Self {
        Self {
            user_id: user.id,
            nickname: user.nickname.clone(),
            connected: user.is_connected(),
            spectator: user.spectator,
            account_id: user.account_id,
            submissions: Vec::new(),
            solved: vec![false; num_problems],
        }
    }

    /// Highest number of test cases passed for the given problem.
    pub fn best_score(&self, problem_index: usize) -> usize {
        self.submissions
            .iter()
            .filter(|submission| submission.problem_index == problem_index)
            .map(|submission| submission.num_correct)
            .max()
            .unwrap_or(0)
    }

    /// Number of attempts recorded for the given problem.
    pub fn attempts(&self, problem_index: usize) -> usize {
        self.submissions
            .iter()
            .filter(|submission| submission.problem_index == problem_index)
            .count()
    }
}

/// Timer handles owned by one session. Held under the session lock so the end
/// sequence can cancel them atomically with the flag flip.
#[derive(Debug, Default)]
pub struct SessionTimers {
    /// End-of-match timer.
    pub end: Option<TimerHandle>,
    /// One "time left" notification timer per milestone offset.
    pub notifications: Vec<TimerHandle>,
    /// Deferred report-generation timer, armed by the end sequence.
    pub report: Option<TimerHandle>,
}

impl SessionTimers {
    /// Cancel every held timer. Idempotent.
    pub fn cancel_all(&self) {
        if let Some(handle) = &self.end {
            handle.cancel();
        }
        for handle in &self.notifications {
            handle.cancel();
        }
        if let Some(handle) = &self.report {
            handle.cancel();
        }
    }
}

/// Mutable state for one active match. All access is serialized through the
/// per-session mutex owned by the registry.
#[derive(Debug)]
pub struct GameSession {
    /// Snapshot of the room taken at session creation.
    pub room: Room,
    /// Problems played this match, in creation order.
    pub problems: Vec<Problem>,
    /// Fixed membership set keyed by user id; users joining the room later do
    /// not become players.
    pub players: IndexMap<Uuid, Player>,
    /// When the match started.
    pub started_at: SystemTime,
    /// Match duration.
    pub duration: Duration,
    /// Timer handles for this session.
    pub timers: SessionTimers,
    manually_ended: bool,
    all_solved: bool,
    time_expired: bool,
    end_sequence_ran: bool,
}

impl GameSession {
    /// Build a session from a room snapshot and its selected problems.
    pub fn new(room: Room, problems: Vec<Problem>) -> Self {
        let num_problems = problems.len();
        let players = room
            .users
            .values()
            .map(|user| (user.id, Player::from_user(user, num_problems)))
            .collect();
        let duration = Duration::from_secs(room.settings.duration_secs);

        Self {
            room,
            problems,
            players,
            started_at: SystemTime::now(),
            duration,
            timers: SessionTimers::default(),
            manually_ended: false,
            all_solved: false,
            time_expired: false,
            end_sequence_ran: false,
        }
    }

    /// Whether any end condition has been reached.
    pub fn is_over(&self) -> bool {
        self.manually_ended || self.all_solved || self.time_expired
    }

    /// Reason the match ended, `None` while it is still running.
    pub fn end_reason(&self) -> Option<EndReason> {
        if self.manually_ended {
            Some(EndReason::ManualEnd)
        } else if self.all_solved {
            Some(EndReason::AllSolved)
        } else if self.time_expired {
            Some(EndReason::TimeUp)
        } else {
            None
        }
    }

    /// Flag the match as stopped by the host.
    pub fn mark_manually_ended(&mut self) {
        self.manually_ended = true;
    }

    /// Flag the match as out of time.
    pub fn mark_time_expired(&mut self) {
        self.time_expired = true;
    }

    /// Append a graded attempt to the player's history, update the solved bit,
    /// and recompute the all-solved condition.
    ///
    /// Returns `None` when the player is not part of this session, otherwise
    /// whether this submission flipped the all-solved condition from false to
    /// true.
    pub fn apply_submission(&mut self, player_id: Uuid, submission: Submission) -> Option<bool> {
        let player = self.players.get_mut(&player_id)?;

        let full_marks = submission.is_full_marks();
        let problem_index = submission.problem_index;
        player.submissions.push(submission);
        if full_marks {
            if let Some(bit) = player.solved.get_mut(problem_index) {
                *bit = true;
            }
        }

        let was_all_solved = self.all_solved;
        self.all_solved = self.every_contestant_solved_everything();
        Some(!was_all_solved && self.all_solved)
    }

    /// Refresh a player's connectivity marker from the latest roster state.
    pub fn reconcile_connectivity(&mut self, user_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&user_id) {
            player.connected = connected;
        }
    }

    /// One-shot transition into the ended state. The first caller after
    /// `is_over()` becomes true gets `true` back and must run the end
    /// sequence; every later caller gets `false`. Pending timers are canceled
    /// before this returns, so no stale callback can fire afterwards.
    pub fn begin_end_sequence(&mut self) -> bool {
        if !self.is_over() || self.end_sequence_ran {
            return false;
        }
        self.end_sequence_ran = true;
        self.timers.cancel_all();
        true
    }

    /// Whether the end sequence has already run for this session.
    pub fn has_ended(&self) -> bool {
        self.end_sequence_ran
    }

    /// Value copy of the session used for broadcasting and report generation.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            room: self.room.clone(),
            problems: self.problems.clone(),
            players: self.players.clone(),
            started_at: self.started_at,
            duration: self.duration,
            end_reason: self.end_reason(),
        }
    }

    fn every_contestant_solved_everything(&self) -> bool {
        let mut contestants = self
            .players
            .values()
            .filter(|player| !player.spectator)
            .peekable();

        contestants.peek().is_some()
            && contestants.all(|player| player.solved.iter().all(|solved| *solved))
    }
}

/// Immutable value copy of a session, captured when the end sequence begins.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Room state at session creation.
    pub room: Room,
    /// Problems played this match.
    pub problems: Vec<Problem>,
    /// Player records at capture time.
    pub players: IndexMap<Uuid, Player>,
    /// When the match started.
    pub started_at: SystemTime,
    /// Match duration.
    pub duration: Duration,
    /// End reason at capture time.
    pub end_reason: Option<EndReason>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        problem::{Difficulty, TestCase},
        room::{RoomSettings, User},
    };

    fn problem(name: &str, cases: usize) -> Problem {
        Problem {
            id: Uuid::new_v4(),
            name: name.into(),
            description: "statement".into(),
            difficulty: Difficulty::Easy,
            test_cases: (0..cases)
                .map(|i| TestCase {
                    input: format!("{i}"),
                    expected_output: format!("{i}"),
                    hidden: i > 0,
                })
                .collect(),
        }
    }

    fn room_with_users(users: Vec<User>) -> Room {
        let mut iter = users.into_iter();
        let mut room = Room::new(iter.next().unwrap());
        for user in iter {
            room.users.insert(user.id, user);
        }
        room.settings = RoomSettings::default();
        room
    }

    fn submission(problem_index: usize, num_correct: usize, num_test_cases: usize) -> Submission {
        Submission {
            problem_index,
            code: "print(1)".into(),
            language: "python".into(),
            results: Vec::new(),
            num_correct,
            num_test_cases,
            runtime_ms: None,
            compilation_error: None,
            submitted_at: SystemTime::now(),
        }
    }

    #[test]
    fn end_reason_follows_fixed_priority() {
        let mut session = GameSession::new(
            room_with_users(vec![User::new("ada".into())]),
            vec![problem("p0", 2)],
        );
        assert_eq!(session.end_reason(), None);

        session.mark_time_expired();
        assert_eq!(session.end_reason(), Some(EndReason::TimeUp));

        session.mark_manually_ended();
        assert_eq!(session.end_reason(), Some(EndReason::ManualEnd));
    }

    #[test]
    fn full_marks_sets_solved_bit_and_stays_solved() {
        let user = User::new("ada".into());
        let user_id = user.id;
        let mut session = GameSession::new(room_with_users(vec![user]), vec![problem("p0", 2)]);

        let transitioned = session
            .apply_submission(user_id, submission(0, 2, 2))
            .unwrap();
        assert!(transitioned);
        assert!(session.players[&user_id].solved[0]);
        assert!(session.is_over());

        // A later failing attempt is recorded but cannot clear the bit.
        let transitioned = session
            .apply_submission(user_id, submission(0, 0, 2))
            .unwrap();
        assert!(!transitioned);
        assert!(session.players[&user_id].solved[0]);
        assert!(session.is_over());
        assert_eq!(session.players[&user_id].submissions.len(), 2);
    }

    #[test]
    fn partial_marks_do_not_solve() {
        let user = User::new("ada".into());
        let user_id = user.id;
        let mut session = GameSession::new(room_with_users(vec![user]), vec![problem("p0", 3)]);

        session.apply_submission(user_id, submission(0, 2, 3));
        assert!(!session.players[&user_id].solved[0]);
        assert!(!session.is_over());
    }

    #[test]
    fn spectators_do_not_block_all_solved() {
        let player = User::new("ada".into());
        let player_id = player.id;
        let mut spectator = User::new("watcher".into());
        spectator.spectator = true;

        let mut session = GameSession::new(
            room_with_users(vec![player, spectator]),
            vec![problem("p0", 1)],
        );

        let transitioned = session
            .apply_submission(player_id, submission(0, 1, 1))
            .unwrap();
        assert!(transitioned);
        assert_eq!(session.end_reason(), Some(EndReason::AllSolved));
    }

    #[test]
    fn unknown_player_is_rejected() {
        let mut session = GameSession::new(
            room_with_users(vec![User::new("ada".into())]),
            vec![problem("p0", 1)],
        );
        assert!(
            session
                .apply_submission(Uuid::new_v4(), submission(0, 1, 1))
                .is_none()
        );
    }

    #[test]
    fn end_sequence_runs_once() {
        let mut session = GameSession::new(
            room_with_users(vec![User::new("ada".into())]),
            vec![problem("p0", 1)],
        );

        assert!(!session.begin_end_sequence());

        session.mark_manually_ended();
        assert!(session.begin_end_sequence());
        assert!(!session.begin_end_sequence());

        session.mark_time_expired();
        assert!(!session.begin_end_sequence());
        assert!(session.has_ended());
    }

    #[test]
    fn players_are_value_copies_of_the_roster() {
        let user = User::new("ada".into());
        let user_id = user.id;
        let mut session = GameSession::new(room_with_users(vec![user]), vec![problem("p0", 1)]);

        session.room.users.get_mut(&user_id).unwrap().session_token = None;
        assert!(session.players[&user_id].connected);

        session.reconcile_connectivity(user_id, false);
        assert!(!session.players[&user_id].connected);
    }
}
