use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload and the number of tracked battles.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.battle_ids().len())
}
