use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::scoring::{ScoringEventRequest, ScoringOutcome},
    services::scoring_service,
    state::SharedState,
};

/// Ingestion endpoint for scored feed events.
pub fn router() -> Router<SharedState> {
    Router::new().route("/scoring/events", post(dispatch_event))
}

/// Report a scored feed event (like, view, comment, upload, streak, daily
/// winner) carrying the new total of the underlying metric.
#[utoipa::path(
    post,
    path = "/scoring/events",
    tag = "scoring",
    request_body = ScoringEventRequest,
    responses((status = 200, description = "Event dispatched", body = ScoringOutcome))
)]
pub async fn dispatch_event(
    State(state): State<SharedState>,
    Json(payload): Json<ScoringEventRequest>,
) -> Json<ScoringOutcome> {
    Json(scoring_service::dispatch(&state, payload).await)
}
