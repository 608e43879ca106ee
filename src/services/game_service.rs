use std::{sync::Arc, time::Duration};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    catalog::CatalogError,
    dto::{
        game::{EndGameRequest, GameDto, StartGameRequest},
        report::GameReportDto,
    },
    error::ServiceError,
    services::{report_service, sse_events},
    state::{
        SharedSession, SharedState,
        problem::Problem,
        session::GameSession,
    },
};

/// Start the match for a room: select problems, build the fixed player set,
/// arm the end-of-match and notification timers, and register the session
/// under the room id (replacing any prior session for that id).
pub async fn start_game(
    state: &SharedState,
    room_id: Uuid,
    request: StartGameRequest,
) -> Result<GameDto, ServiceError> {
    let room = {
        let room = state
            .rooms()
            .get(&room_id)
            .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
        room.clone()
    };

    if !room.is_host(request.initiator_id) {
        return Err(ServiceError::Unauthorized(
            "only the host can start the match".into(),
        ));
    }
    if room.settings.num_problems == 0 {
        return Err(ServiceError::InvalidInput(
            "a match needs at least one problem".into(),
        ));
    }
    if room.users.values().all(|user| user.spectator) {
        return Err(ServiceError::InvalidInput(
            "a match requires at least one contestant".into(),
        ));
    }

    let problems = select_problems(state, &room).await?;

    if let Some(mut live) = state.rooms().get_mut(&room_id) {
        live.active = true;
    }
    let mut room_snapshot = room;
    room_snapshot.active = true;

    let session = GameSession::new(room_snapshot, problems);
    let duration = session.duration;

    let (shared, prior) = state.sessions().insert(room_id, session);
    if let Some(prior) = prior {
        // A replaced session must not keep firing timers for this room.
        prior.lock().await.timers.cancel_all();
    }

    let snapshot = {
        let mut guard = shared.lock().await;

        guard.timers.end = Some(state.scheduler().schedule(
            duration,
            handle_time_up(state.clone(), room_id, Arc::clone(&shared)),
        ));

        for &milestone in &state.config().milestones_secs {
            let offset = Duration::from_secs(milestone);
            if offset >= duration {
                continue;
            }
            let handle = state.scheduler().schedule(
                duration - offset,
                handle_time_left(state.clone(), room_id, Arc::clone(&shared), milestone),
            );
            guard.timers.notifications.push(handle);
        }

        guard.snapshot()
    };

    info!(%room_id, duration_secs = duration.as_secs(), "match started");
    sse_events::broadcast_game_started(state, &snapshot);
    Ok(GameDto::from(&snapshot))
}

/// Stop the match early. Host-only; rejected once the match is already over.
pub async fn end_game(
    state: &SharedState,
    room_id: Uuid,
    request: EndGameRequest,
) -> Result<GameDto, ServiceError> {
    let live_host = state
        .rooms()
        .get(&room_id)
        .map(|room| room.is_host(request.initiator_id));

    let shared = state
        .sessions()
        .get(room_id)
        .ok_or_else(|| ServiceError::NotFound(format!("no active game for room `{room_id}`")))?;
    let mut guard = shared.lock().await;

    let authorized = live_host.unwrap_or_else(|| guard.room.is_host(request.initiator_id));
    if !authorized {
        return Err(ServiceError::Unauthorized(
            "only the host can end the match".into(),
        ));
    }
    if guard.is_over() {
        return Err(ServiceError::InvalidState("the match is already over".into()));
    }

    guard.mark_manually_ended();
    finish_if_needed(state, &mut guard);
    Ok(GameDto::from(&guard.snapshot()))
}

/// Current match snapshot for a room.
pub async fn get_game(state: &SharedState, room_id: Uuid) -> Result<GameDto, ServiceError> {
    let shared = state
        .sessions()
        .get(room_id)
        .ok_or_else(|| ServiceError::NotFound(format!("no active game for room `{room_id}`")))?;
    let guard = shared.lock().await;
    Ok(GameDto::from(&guard.snapshot()))
}

/// Report for a room's last finished match, once generated.
pub async fn get_report(
    state: &SharedState,
    room_id: Uuid,
) -> Result<GameReportDto, ServiceError> {
    let report = state.reports().find_by_room(room_id).await?;
    report
        .as_ref()
        .map(GameReportDto::from)
        .ok_or_else(|| ServiceError::NotFound(format!("no report for room `{room_id}`")))
}

/// Run the end sequence if the session has reached an end condition and the
/// sequence has not run yet. Called with the session lock held by every path
/// that can flip an end flag; losing callers are silent no-ops.
///
/// The sequence cancels every pending timer before the lock is released,
/// broadcasts the terminal snapshot, and arms the deferred report timer.
pub(crate) fn finish_if_needed(state: &SharedState, session: &mut GameSession) {
    if !session.begin_end_sequence() {
        return;
    }

    let room_id = session.room.id;
    if let Some(mut room) = state.rooms().get_mut(&room_id) {
        room.active = false;
    }

    let snapshot = session.snapshot();
    info!(%room_id, reason = ?snapshot.end_reason, "match ended");
    sse_events::broadcast_game_ended(state, &snapshot);

    let delay = state.config().report_delay;
    session.timers.report = Some(state.scheduler().schedule(
        delay,
        report_service::generate_report(state.clone(), room_id, snapshot),
    ));
}

/// End-of-match timer callback. Bound to the session it was armed for; a
/// callback whose session has been replaced in the registry is a no-op.
async fn handle_time_up(state: SharedState, room_id: Uuid, session: SharedSession) {
    let mut guard = session.lock().await;
    if !is_current_session(&state, room_id, &session) || guard.is_over() {
        return;
    }
    guard.mark_time_expired();
    finish_if_needed(&state, &mut guard);
}

/// "Time left" notification timer callback, bound like [`handle_time_up`].
async fn handle_time_left(
    state: SharedState,
    room_id: Uuid,
    session: SharedSession,
    seconds_left: u64,
) {
    let guard = session.lock().await;
    if !is_current_session(&state, room_id, &session) || guard.is_over() {
        return;
    }
    debug!(%room_id, seconds_left, "time-left milestone");
    sse_events::broadcast_time_left(&state, room_id, seconds_left);
}

/// Whether `session` is still the registry's entry for the room. Cancellation
/// cannot stop a callback already past its delay, so stale callbacks from a
/// replaced session must be detected by identity.
fn is_current_session(state: &SharedState, room_id: Uuid, session: &SharedSession) -> bool {
    state
        .sessions()
        .get(room_id)
        .is_some_and(|current| Arc::ptr_eq(&current, session))
}

async fn select_problems(
    state: &SharedState,
    room: &crate::state::room::Room,
) -> Result<Vec<Problem>, ServiceError> {
    let settings = &room.settings;
    let problems = if settings.selected_problems.is_empty() {
        state
            .catalog()
            .pick_random(settings.difficulty, settings.num_problems)
            .await
    } else {
        state
            .catalog()
            .find_many(settings.selected_problems.clone())
            .await
    };

    problems.map_err(|err| match err {
        CatalogError::Insufficient { .. } | CatalogError::NotFound(_) => {
            ServiceError::InvalidInput(err.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::advance;

    use super::*;
    use crate::{
        catalog::InMemoryCatalog,
        config::AppConfig,
        dao::{
            accounts::InMemoryAccountStore,
            reports::{InMemoryReportStore, ReportStore},
        },
        dto::{
            room::{CreateRoomRequest, JoinRoomRequest, UpdateSettingsRequest},
            sse::ServerEvent,
            submission::SubmitRequest,
        },
        judge::offline::OfflineJudge,
        services::{room_service, submission_service},
        state::{
            problem::{Difficulty, Problem, TestCase},
            session::EndReason,
        },
    };

    fn sample_problem() -> Problem {
        Problem {
            id: Uuid::new_v4(),
            name: "echo".into(),
            description: "print the input".into(),
            difficulty: Difficulty::Easy,
            test_cases: vec![
                TestCase {
                    input: "1".into(),
                    expected_output: "1".into(),
                    hidden: false,
                },
                TestCase {
                    input: "2".into(),
                    expected_output: "2".into(),
                    hidden: true,
                },
            ],
        }
    }

    fn test_state(num_problems_in_bank: usize) -> SharedState {
        let catalog = InMemoryCatalog::with_problems(
            (0..num_problems_in_bank).map(|_| sample_problem()).collect(),
        );
        crate::state::AppState::new(
            AppConfig::default(),
            Arc::new(catalog),
            Arc::new(OfflineJudge),
            Arc::new(InMemoryAccountStore::default()),
            Arc::new(InMemoryReportStore::default()),
        )
    }

    async fn lobby(state: &SharedState, duration_secs: u64, num_problems: usize) -> (Uuid, Uuid) {
        let created = room_service::create_room(
            state,
            CreateRoomRequest {
                nickname: "host".into(),
            },
        )
        .await
        .unwrap();
        let room_id = created.room.id;
        room_service::update_settings(
            state,
            room_id,
            UpdateSettingsRequest {
                initiator_id: created.user_id,
                difficulty: None,
                duration_secs: Some(duration_secs),
                num_problems: Some(num_problems),
                size: None,
                selected_problems: None,
            },
        )
        .await
        .unwrap();
        (room_id, created.user_id)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn drain_events(
        receiver: &mut tokio::sync::broadcast::Receiver<ServerEvent>,
    ) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    fn count_named(events: &[ServerEvent], name: &str) -> usize {
        events
            .iter()
            .filter(|event| event.event.as_deref() == Some(name))
            .count()
    }

    #[tokio::test]
    async fn start_requires_problems_in_the_bank() {
        let state = test_state(1);
        let (room_id, host_id) = lobby(&state, 900, 3).await;

        let err = start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn start_is_host_only() {
        let state = test_state(1);
        let (room_id, _host_id) = lobby(&state, 900, 1).await;
        let outsider = Uuid::new_v4();

        let err = start_game(&state, room_id, StartGameRequest { initiator_id: outsider })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn time_up_ends_the_match_exactly_once() {
        let state = test_state(1);
        let (room_id, host_id) = lobby(&state, 15, 1).await;
        let mut receiver = state.broadcaster().subscribe(room_id);

        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();

        advance(Duration::from_secs(16)).await;
        settle().await;
        // Long after the deadline nothing else may fire.
        advance(Duration::from_secs(3600)).await;
        settle().await;

        let events = drain_events(&mut receiver);
        assert_eq!(count_named(&events, "game.ended"), 1);

        let game = get_game(&state, room_id).await.unwrap();
        assert_eq!(game.end_reason, Some(EndReason::TimeUp));
    }

    #[tokio::test(start_paused = true)]
    async fn racing_end_triggers_broadcast_once() {
        let state = test_state(1);
        let (room_id, host_id) = lobby(&state, 15, 1).await;
        let mut receiver = state.broadcaster().subscribe(room_id);

        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();

        // Manual end and the end-of-match callback compete for the same
        // one-shot transition.
        let shared = state.sessions().get(room_id).unwrap();
        let manual = end_game(&state, room_id, EndGameRequest { initiator_id: host_id });
        let timer = handle_time_up(state.clone(), room_id, shared);
        let (manual_result, ()) = tokio::join!(manual, timer);

        // The manual path either won the race or lost it to the timer; both
        // interleavings must produce exactly one terminal broadcast.
        match manual_result {
            Ok(game) => assert!(game.end_reason.is_some()),
            Err(ServiceError::InvalidState(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }

        advance(Duration::from_secs(3600)).await;
        settle().await;

        let events = drain_events(&mut receiver);
        assert_eq!(count_named(&events, "game.ended"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn milestones_fire_while_the_match_runs() {
        let state = test_state(1);
        // Duration 60 with default milestones arms offsets 30 and 10.
        let (room_id, host_id) = lobby(&state, 60, 1).await;
        let mut receiver = state.broadcaster().subscribe(room_id);

        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();

        advance(Duration::from_secs(31)).await;
        settle().await;
        let events = drain_events(&mut receiver);
        assert_eq!(count_named(&events, "game.time_left"), 1);

        advance(Duration::from_secs(20)).await;
        settle().await;
        let events = drain_events(&mut receiver);
        assert_eq!(count_named(&events, "game.time_left"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_end_cancels_every_pending_timer() {
        let state = test_state(1);
        let (room_id, host_id) = lobby(&state, 60, 1).await;
        let mut receiver = state.broadcaster().subscribe(room_id);

        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();

        end_game(&state, room_id, EndGameRequest { initiator_id: host_id })
            .await
            .unwrap();

        // Past every originally scheduled notification and the deadline.
        advance(Duration::from_secs(3600)).await;
        settle().await;

        let events = drain_events(&mut receiver);
        assert_eq!(count_named(&events, "game.ended"), 1);
        assert_eq!(count_named(&events, "game.time_left"), 0);

        let game = get_game(&state, room_id).await.unwrap();
        assert_eq!(game.end_reason, Some(EndReason::ManualEnd));
    }

    #[tokio::test(start_paused = true)]
    async fn all_solved_scenario_ends_early_and_defers_the_report() {
        let state = test_state(1);
        let (room_id, host_id) = lobby(&state, 15, 1).await;
        let mut receiver = state.broadcaster().subscribe(room_id);

        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();

        advance(Duration::from_secs(3)).await;
        settle().await;

        // Full marks from the only contestant end the match at t=3s, before
        // the 10s-left milestone would fire.
        submission_service::submit_solution(
            &state,
            room_id,
            SubmitRequest {
                user_id: host_id,
                problem_index: 0,
                code: "print(input())".into(),
                language: "python".into(),
            },
        )
        .await
        .unwrap();

        let game = get_game(&state, room_id).await.unwrap();
        assert_eq!(game.end_reason, Some(EndReason::AllSolved));

        // The 15s end timer and the milestone at t=5s must stay silent.
        advance(Duration::from_secs(30)).await;
        settle().await;
        let events = drain_events(&mut receiver);
        assert_eq!(count_named(&events, "game.ended"), 1);
        assert_eq!(count_named(&events, "game.time_left"), 0);

        // Report generation is deferred by the configured delay (60s).
        assert!(
            state
                .reports()
                .find_by_room(room_id)
                .await
                .unwrap()
                .is_none()
        );
        advance(Duration::from_secs(60)).await;
        settle().await;
        let report = state
            .reports()
            .find_by_room(room_id)
            .await
            .unwrap()
            .expect("report should exist after the deferred delay");
        assert_eq!(report.end_reason, EndReason::AllSolved);
        assert_eq!(report.players.len(), 1);
        assert_eq!(report.players[0].solved_bits, "1");
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_session_timer_does_not_end_the_new_match() {
        let state = test_state(1);
        let (room_id, host_id) = lobby(&state, 15, 1).await;
        let mut receiver = state.broadcaster().subscribe(room_id);

        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();
        let first = state.sessions().get(room_id).unwrap();

        // Restarting replaces the session under the same room id. A deadline
        // callback from the first session that slipped past cancellation must
        // not end the fresh match.
        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();
        handle_time_up(state.clone(), room_id, first).await;

        let game = get_game(&state, room_id).await.unwrap();
        assert_eq!(game.end_reason, None);
        let events = drain_events(&mut receiver);
        assert_eq!(count_named(&events, "game.ended"), 0);
    }

    #[tokio::test]
    async fn late_joiners_are_not_players() {
        let state = test_state(1);
        let (room_id, host_id) = lobby(&state, 900, 1).await;

        start_game(&state, room_id, StartGameRequest { initiator_id: host_id })
            .await
            .unwrap();

        let late = room_service::join_room(
            &state,
            room_id,
            JoinRoomRequest {
                nickname: "late".into(),
                spectator: false,
                account_id: None,
            },
        )
        .await
        .unwrap();

        let game = get_game(&state, room_id).await.unwrap();
        assert_eq!(game.players.len(), 1);
        assert!(game.players.iter().all(|p| p.user_id != late.user_id));
    }
}
