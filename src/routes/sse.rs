use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/rooms/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Room event stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Room not found")
    )
)]
/// Stream realtime room and match events to connected clients.
pub async fn room_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let receiver = sse_service::subscribe_room(&state, id)?;
    info!(room_id = %id, "new SSE connection");
    Ok(sse_service::to_sse_stream(id, receiver))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{id}/events", get(room_events))
}
