use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok").
    pub status: String,
    /// Whether grading requests are answered by the offline fallback judge.
    pub judge_offline: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(judge_offline: bool) -> Self {
        Self {
            status: "ok".to_string(),
            judge_offline,
        }
    }
}
