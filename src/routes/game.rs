use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        game::{EndGameRequest, GameDto, StartGameRequest},
        report::GameReportDto,
        submission::{RunRequest, RunResultDto, SubmitRequest, SubmissionDto},
    },
    error::AppError,
    services::{game_service, submission_service},
    state::SharedState,
};

/// Routes covering the match lifecycle: start, inspection, grading, manual
/// end, and the post-match report.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{id}/start", post(start_game))
        .route("/rooms/{id}/game", get(get_game))
        .route("/rooms/{id}/end", post(end_game))
        .route("/rooms/{id}/run", post(run_code))
        .route("/rooms/{id}/submit", post(submit_solution))
        .route("/rooms/{id}/report", get(get_report))
}

#[utoipa::path(
    post,
    path = "/rooms/{id}/start",
    tag = "game",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Match started", body = GameDto),
        (status = 400, description = "Settings or problem bank cannot support the match"),
        (status = 401, description = "Initiator is not the host")
    )
)]
/// Start the match for a room.
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StartGameRequest>,
) -> Result<Json<GameDto>, AppError> {
    let game = game_service::start_game(&state, id, payload).await?;
    Ok(Json(game))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}/game",
    tag = "game",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Current match snapshot", body = GameDto),
        (status = 404, description = "No match for this room")
    )
)]
/// Fetch the current match snapshot for a room.
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDto>, AppError> {
    let game = game_service::get_game(&state, id).await?;
    Ok(Json(game))
}

#[utoipa::path(
    post,
    path = "/rooms/{id}/end",
    tag = "game",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = EndGameRequest,
    responses(
        (status = 200, description = "Match stopped", body = GameDto),
        (status = 401, description = "Initiator is not the host"),
        (status = 409, description = "Match is already over")
    )
)]
/// Stop the match early. Host-only.
pub async fn end_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EndGameRequest>,
) -> Result<Json<GameDto>, AppError> {
    let game = game_service::end_game(&state, id, payload).await?;
    Ok(Json(game))
}

#[utoipa::path(
    post,
    path = "/rooms/{id}/run",
    tag = "game",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = RunRequest,
    responses(
        (status = 200, description = "Dry-run outcome", body = RunResultDto),
        (status = 409, description = "Match is over"),
        (status = 502, description = "Judge unavailable")
    )
)]
/// Dry-run code against a single custom input. Nothing is recorded.
pub async fn run_code(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResultDto>, AppError> {
    payload.validate()?;
    let result = submission_service::run_code(&state, id, payload).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/rooms/{id}/submit",
    tag = "game",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission graded and recorded", body = SubmissionDto),
        (status = 401, description = "Submitter is not a player of this match"),
        (status = 409, description = "Match is over"),
        (status = 502, description = "Judge unavailable; nothing was recorded")
    )
)]
/// Submit a solution for grading against the problem's full test-case set.
pub async fn submit_solution(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmissionDto>, AppError> {
    payload.validate()?;
    let submission = submission_service::submit_solution(&state, id, payload).await?;
    Ok(Json(submission))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}/report",
    tag = "game",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Post-match report", body = GameReportDto),
        (status = 404, description = "No report generated yet")
    )
)]
/// Fetch the report for a room's last finished match.
pub async fn get_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameReportDto>, AppError> {
    let report = game_service::get_report(&state, id).await?;
    Ok(Json(report))
}
