use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok").
    pub status: String,
    /// Number of battles currently tracked.
    pub battles: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(battles: usize) -> Self {
        Self {
            status: "ok".to_string(),
            battles,
        }
    }
}
