use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::submission::{RunRequest, RunResultDto, SubmitRequest, SubmissionDto},
    error::ServiceError,
    judge::{JudgeJob, JudgeTestCase},
    services::{game_service, sse_events},
    state::{SharedSession, SharedState, session::Submission},
};

/// Grade a submission against the problem's full test-case set and record it
/// on the player.
///
/// The judge round trip happens with the session lock released: the job inputs
/// are copied out under the lock, the judge is called, and the lock is
/// re-acquired to record the verdict. A match that ended during the round trip
/// rejects the late verdict so the terminal broadcast stays authoritative.
pub async fn submit_solution(
    state: &SharedState,
    room_id: Uuid,
    request: SubmitRequest,
) -> Result<SubmissionDto, ServiceError> {
    let shared = lookup_session(state, room_id)?;

    let job = {
        let guard = shared.lock().await;
        if guard.is_over() {
            return Err(ServiceError::InvalidState("the match is over".into()));
        }
        require_contestant(&guard, request.user_id)?;
        let problem = guard.problems.get(request.problem_index).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "problem index {} out of range",
                request.problem_index
            ))
        })?;

        JudgeJob {
            code: request.code.clone(),
            language: request.language.clone(),
            test_cases: problem
                .test_cases
                .iter()
                .map(|case| JudgeTestCase {
                    input: case.input.clone(),
                    expected_output: case.expected_output.clone(),
                })
                .collect(),
        }
    };

    // Lock released; other players keep submitting while this one is graded.
    let verdict = state.judge().execute(job).await?;

    let submission = Submission {
        problem_index: request.problem_index,
        code: request.code,
        language: request.language,
        results: verdict.results,
        num_correct: verdict.num_correct,
        num_test_cases: verdict.num_test_cases,
        runtime_ms: verdict.runtime_ms,
        compilation_error: verdict.compilation_error,
        submitted_at: SystemTime::now(),
    };

    let mut guard = shared.lock().await;
    if guard.is_over() {
        // Ended while the judge was grading; nothing is recorded.
        return Err(ServiceError::InvalidState("the match is over".into()));
    }

    let dto = SubmissionDto::from(&submission);
    let num_correct = submission.num_correct;
    let num_test_cases = submission.num_test_cases;
    let all_solved_now = guard
        .apply_submission(request.user_id, submission)
        .ok_or_else(|| {
            ServiceError::Unauthorized("only players of this match can submit".into())
        })?;

    debug!(
        %room_id,
        user_id = %request.user_id,
        problem_index = request.problem_index,
        num_correct,
        num_test_cases,
        "submission recorded"
    );
    sse_events::broadcast_submission_recorded(
        state,
        room_id,
        request.user_id,
        request.problem_index,
        num_correct,
        num_test_cases,
    );

    if all_solved_now {
        game_service::finish_if_needed(state, &mut guard);
    }

    Ok(dto)
}

/// Dry-run code against a single custom input. Nothing is recorded on the
/// player and the all-solved condition is never evaluated.
pub async fn run_code(
    state: &SharedState,
    room_id: Uuid,
    request: RunRequest,
) -> Result<RunResultDto, ServiceError> {
    let shared = lookup_session(state, room_id)?;

    let job = {
        let guard = shared.lock().await;
        if guard.is_over() {
            return Err(ServiceError::InvalidState("the match is over".into()));
        }
        require_contestant(&guard, request.user_id)?;
        if guard.problems.get(request.problem_index).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "problem index {} out of range",
                request.problem_index
            )));
        }

        JudgeJob {
            code: request.code,
            language: request.language,
            test_cases: vec![JudgeTestCase {
                input: request.input,
                expected_output: String::new(),
            }],
        }
    };

    let verdict = state.judge().execute(job).await?;
    Ok(RunResultDto::from(verdict))
}

fn lookup_session(state: &SharedState, room_id: Uuid) -> Result<SharedSession, ServiceError> {
    state
        .sessions()
        .get(room_id)
        .ok_or_else(|| ServiceError::NotFound(format!("no active game for room `{room_id}`")))
}

/// Grading is for competing players only. Spectators hold a player record for
/// connectivity tracking but are watch-only.
fn require_contestant(
    session: &crate::state::session::GameSession,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    match session.players.get(&user_id) {
        Some(player) if !player.spectator => Ok(()),
        Some(_) => Err(ServiceError::Unauthorized(
            "spectators cannot submit code".into(),
        )),
        None => Err(ServiceError::Unauthorized(
            "only players of this match can submit".into(),
        )),
    }
}
