use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Code Clash Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::get_room,
        crate::routes::room::join_room,
        crate::routes::room::leave_room,
        crate::routes::room::change_host,
        crate::routes::room::update_connection,
        crate::routes::room::update_settings,
        crate::routes::game::start_game,
        crate::routes::game::get_game,
        crate::routes::game::end_game,
        crate::routes::game::run_code,
        crate::routes::game::submit_solution,
        crate::routes::game::get_report,
        crate::routes::sse::room_events,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::LeaveRoomRequest,
            crate::dto::room::ChangeHostRequest,
            crate::dto::room::ConnectionUpdateRequest,
            crate::dto::room::UpdateSettingsRequest,
            crate::dto::room::UserDto,
            crate::dto::room::SettingsDto,
            crate::dto::room::RoomDto,
            crate::dto::room::RoomMembership,
            crate::dto::game::StartGameRequest,
            crate::dto::game::EndGameRequest,
            crate::dto::game::TestCaseDto,
            crate::dto::game::ProblemDto,
            crate::dto::game::PlayerDto,
            crate::dto::game::GameDto,
            crate::dto::submission::SubmitRequest,
            crate::dto::submission::RunRequest,
            crate::dto::submission::SubmissionDto,
            crate::dto::submission::RunResultDto,
            crate::dto::report::ProblemStatsDto,
            crate::dto::report::PlayerStatsDto,
            crate::dto::report::GameReportDto,
            crate::dto::sse::RoomUpdatedEvent,
            crate::dto::sse::HostChangedEvent,
            crate::dto::sse::GameStartedEvent,
            crate::dto::sse::TimeLeftEvent,
            crate::dto::sse::SubmissionRecordedEvent,
            crate::dto::sse::GameEndedEvent,
            crate::judge::CaseResult,
            crate::state::problem::Difficulty,
            crate::state::session::EndReason,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Lobby lifecycle and membership"),
        (name = "game", description = "Match lifecycle, grading, and reports"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
