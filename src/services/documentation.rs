use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trick Battle Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::battle::list_battles,
        crate::routes::battle::get_battle,
        crate::routes::battle::create_battle,
        crate::routes::battle::join_battle,
        crate::routes::battle::start_battle,
        crate::routes::battle::cancel_battle,
        crate::routes::battle::declare_winner,
        crate::routes::battle::submit_video,
        crate::routes::battle::judge_decision,
        crate::routes::battle::handle_deadline_expiry,
        crate::routes::achievement::list_achievements,
        crate::routes::achievement::user_achievements,
        crate::routes::scoring::dispatch_event,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::battle::BattleSummary,
            crate::dto::battle::BattleListItem,
            crate::dto::battle::CreateBattleRequest,
            crate::dto::battle::JoinBattleRequest,
            crate::dto::battle::SubmitVideoRequest,
            crate::dto::battle::JudgeDecisionRequest,
            crate::dto::battle::DeclareWinnerRequest,
            crate::dto::battle::ParticipantSummary,
            crate::dto::battle::ParticipantStatusSummary,
            crate::dto::battle::ReferenceVideoSummary,
            crate::dto::battle::VideoSummary,
            crate::dto::battle::VerdictSummary,
            crate::dto::battle::TurnSummary,
            crate::dto::achievement::AchievementSummary,
            crate::dto::achievement::UserAchievementSummary,
            crate::dto::scoring::ScoringEventRequest,
            crate::dto::scoring::ScoringOutcome,
            crate::dto::phase::VisibleBattleStatus,
        )
    ),
    tags(
        (name = "battles", description = "Battle lifecycle, turns, and judgments"),
        (name = "achievements", description = "Achievement catalog and progress"),
        (name = "scoring", description = "Scored feed event ingestion"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
