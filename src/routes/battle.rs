use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::battle::{
        BattleListItem, BattleSummary, CreateBattleRequest, DeclareWinnerRequest,
        JoinBattleRequest, JudgeDecisionRequest, SubmitVideoRequest,
    },
    error::AppError,
    routes::CurrentUser,
    services::{battle_service, judgment_service, scheduler},
    state::SharedState,
};

/// Battle operations: lifecycle, turns, submissions, and judgments.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/battles", get(list_battles).post(create_battle))
        .route("/battles/{id}", get(get_battle))
        .route("/battles/{id}/join", post(join_battle))
        .route("/battles/{id}/start", post(start_battle))
        .route("/battles/{id}/cancel", post(cancel_battle))
        .route("/battles/{id}/winner", post(declare_winner))
        .route("/battles/{id}/videos", post(submit_video))
        .route("/battles/{id}/videos/{video_id}/judge", post(judge_decision))
        .route("/battles/{id}/expiry", post(handle_deadline_expiry))
}

/// List every battle known to the backend.
#[utoipa::path(
    get,
    path = "/battles",
    tag = "battles",
    responses((status = 200, description = "List battles", body = [BattleListItem]))
)]
pub async fn list_battles(State(state): State<SharedState>) -> Json<Vec<BattleListItem>> {
    Json(battle_service::list_battles(&state).await)
}

/// Retrieve one battle with its roster, submissions, and current turn.
#[utoipa::path(
    get,
    path = "/battles/{id}",
    tag = "battles",
    params(("id" = Uuid, Path, description = "Identifier of the battle")),
    responses((status = 200, description = "Battle", body = BattleSummary))
)]
pub async fn get_battle(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BattleSummary>, AppError> {
    Ok(Json(battle_service::get_battle(&state, id).await?))
}

/// Create a battle with the acting user as its organizer.
#[utoipa::path(
    post,
    path = "/battles",
    tag = "battles",
    params(("X-User-Id" = String, Header, description = "Acting user id")),
    request_body = CreateBattleRequest,
    responses((status = 200, description = "Battle created", body = BattleSummary))
)]
pub async fn create_battle(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CreateBattleRequest>,
) -> Result<Json<BattleSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        battle_service::create_battle(&state, user_id, payload).await?,
    ))
}

/// Join a battle during its registration phase.
#[utoipa::path(
    post,
    path = "/battles/{id}/join",
    tag = "battles",
    params(("X-User-Id" = String, Header, description = "Acting user id"),
    ("id" = Uuid, Path, description = "Identifier of the battle")),
    request_body = JoinBattleRequest,
    responses((status = 200, description = "Joined", body = BattleSummary))
)]
pub async fn join_battle(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinBattleRequest>,
) -> Result<Json<BattleSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        battle_service::join_battle(&state, id, user_id, payload).await?,
    ))
}

/// Start the battle (organizer only; needs at least two riders).
#[utoipa::path(
    post,
    path = "/battles/{id}/start",
    tag = "battles",
    params(("X-User-Id" = String, Header, description = "Acting user id"),
    ("id" = Uuid, Path, description = "Identifier of the battle")),
    responses((status = 200, description = "Battle started", body = BattleSummary))
)]
pub async fn start_battle(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BattleSummary>, AppError> {
    Ok(Json(
        battle_service::start_battle(&state, id, user_id).await?,
    ))
}

/// Cancel the battle before completion (organizer only).
#[utoipa::path(
    post,
    path = "/battles/{id}/cancel",
    tag = "battles",
    params(("X-User-Id" = String, Header, description = "Acting user id"),
    ("id" = Uuid, Path, description = "Identifier of the battle")),
    responses((status = 200, description = "Battle cancelled", body = BattleSummary))
)]
pub async fn cancel_battle(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BattleSummary>, AppError> {
    Ok(Json(
        battle_service::cancel_battle(&state, id, user_id).await?,
    ))
}

/// Declare the winner outright (judge or organizer only).
#[utoipa::path(
    post,
    path = "/battles/{id}/winner",
    tag = "battles",
    params(("X-User-Id" = String, Header, description = "Acting user id"),
    ("id" = Uuid, Path, description = "Identifier of the battle")),
    request_body = DeclareWinnerRequest,
    responses((status = 200, description = "Winner declared", body = BattleSummary))
)]
pub async fn declare_winner(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeclareWinnerRequest>,
) -> Result<Json<BattleSummary>, AppError> {
    Ok(Json(
        battle_service::declare_winner(&state, id, user_id, payload).await?,
    ))
}

/// Submit a video for the acting user's current turn.
#[utoipa::path(
    post,
    path = "/battles/{id}/videos",
    tag = "battles",
    params(("X-User-Id" = String, Header, description = "Acting user id"),
    ("id" = Uuid, Path, description = "Identifier of the battle")),
    request_body = SubmitVideoRequest,
    responses((status = 200, description = "Video submitted", body = BattleSummary))
)]
pub async fn submit_video(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitVideoRequest>,
) -> Result<Json<BattleSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        judgment_service::submit_video(&state, id, user_id, payload).await?,
    ))
}

/// Approve or reject a pending submission (judges only).
#[utoipa::path(
    post,
    path = "/battles/{id}/videos/{video_id}/judge",
    tag = "battles",
    params(("X-User-Id" = String, Header, description = "Acting user id"),
    ("id" = Uuid, Path, description = "Identifier of the battle"),
    ("video_id" = Uuid, Path, description = "Identifier of the submission")),
    request_body = JudgeDecisionRequest,
    responses((status = 200, description = "Decision applied", body = BattleSummary))
)]
pub async fn judge_decision(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<JudgeDecisionRequest>,
) -> Result<Json<BattleSummary>, AppError> {
    Ok(Json(
        judgment_service::judge_decision(&state, id, video_id, user_id, payload.approve).await?,
    ))
}

/// Trigger deadline-expiry handling for a battle. Intended for external
/// schedulers; safe to call redundantly.
#[utoipa::path(
    post,
    path = "/battles/{id}/expiry",
    tag = "battles",
    params(("id" = Uuid, Path, description = "Identifier of the battle")),
    responses((status = 200, description = "Expiry handled", body = BattleSummary))
)]
pub async fn handle_deadline_expiry(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BattleSummary>, AppError> {
    Ok(Json(scheduler::handle_deadline_expiry(&state, id).await?))
}
