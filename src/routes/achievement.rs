use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::achievement::{AchievementSummary, UserAchievementSummary},
    services::achievement_service,
    state::SharedState,
};

/// Read-only achievement catalog and progress endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/achievements", get(list_achievements))
        .route("/users/{id}/achievements", get(user_achievements))
}

/// Active achievement catalog.
#[utoipa::path(
    get,
    path = "/achievements",
    tag = "achievements",
    responses((status = 200, description = "Achievement catalog", body = [AchievementSummary]))
)]
pub async fn list_achievements(State(state): State<SharedState>) -> Json<Vec<AchievementSummary>> {
    let catalog = state
        .achievements()
        .catalog()
        .iter()
        .filter(|achievement| achievement.is_active)
        .map(Into::into)
        .collect();
    Json(catalog)
}

/// A user's progress across the whole catalog.
#[utoipa::path(
    get,
    path = "/users/{id}/achievements",
    tag = "achievements",
    params(("id" = Uuid, Path, description = "User identifier")),
    responses((status = 200, description = "Progress entries", body = [UserAchievementSummary]))
)]
pub async fn user_achievements(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<UserAchievementSummary>> {
    Json(achievement_service::progress_for_user(&state, id))
}
