use std::{
    collections::HashSet,
    time::SystemTime,
};

use tracing::{error, info};
use uuid::Uuid;

use crate::state::{
    SharedState,
    report::{GameReport, PlayerStats, ProblemStats},
    session::SessionSnapshot,
};

/// Deferred timer job armed by the end sequence. Builds the report from the
/// terminal snapshot, persists it, and links it to every distinct account
/// present in the room. Failures are logged; there is no client to answer.
pub async fn generate_report(state: SharedState, room_id: Uuid, snapshot: SessionSnapshot) {
    let Some(report) = build_report(room_id, &snapshot) else {
        info!(%room_id, "match ended without an end reason; skipping report");
        return;
    };
    let report_id = report.id;

    let accounts: HashSet<Uuid> = snapshot
        .room
        .users
        .values()
        .filter_map(|user| user.account_id)
        .collect();

    if let Err(err) = state.reports().save(report).await {
        error!(%room_id, error = %err, "failed to persist report");
        return;
    }
    info!(%room_id, %report_id, "report generated");

    for account_id in accounts {
        if let Err(err) = state.accounts().link_report(account_id, report_id).await {
            error!(%room_id, %account_id, error = %err, "failed to link report");
        }
    }
}

/// Compute the statistics record from a terminal snapshot. Spectators are
/// excluded from every aggregate. Returns `None` for a snapshot captured
/// before any end condition, which the end sequence never produces.
pub fn build_report(room_id: Uuid, snapshot: &SessionSnapshot) -> Option<GameReport> {
    let end_reason = snapshot.end_reason?;

    let contestants: Vec<_> = snapshot
        .players
        .values()
        .filter(|player| !player.spectator)
        .collect();
    let num_contestants = contestants.len();

    let problems = snapshot
        .problems
        .iter()
        .enumerate()
        .map(|(index, problem)| {
            let solved_count = contestants
                .iter()
                .filter(|player| player.solved.get(index).copied().unwrap_or(false))
                .count();
            let total_best: usize = contestants
                .iter()
                .map(|player| player.best_score(index))
                .sum();
            let total_attempts: usize = contestants
                .iter()
                .map(|player| player.attempts(index))
                .sum();

            ProblemStats {
                problem_id: problem.id,
                name: problem.name.clone(),
                solved_count,
                average_best_passed: average(total_best, num_contestants),
                average_attempts: average(total_attempts, num_contestants),
            }
        })
        .collect();

    let players = contestants
        .iter()
        .map(|player| {
            let solved_bits = player
                .solved
                .iter()
                .map(|solved| if *solved { '1' } else { '0' })
                .collect();
            let total_best_passed = (0..snapshot.problems.len())
                .map(|index| player.best_score(index))
                .sum();

            PlayerStats {
                user_id: player.user_id,
                nickname: player.nickname.clone(),
                account_id: player.account_id,
                solved_bits,
                total_best_passed,
            }
        })
        .collect();

    Some(GameReport {
        id: Uuid::new_v4(),
        room_id,
        end_reason,
        created_at: SystemTime::now(),
        duration: snapshot.duration,
        problems,
        players,
    })
}

fn average(total: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
