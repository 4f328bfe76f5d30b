//! Scoring dispatcher: converts scored feed events into point credits,
//! achievement progress, and best-effort notifications. Events carry new
//! totals rather than deltas, so redelivery cannot double-count progress.

use serde_json::json;
use uuid::Uuid;

use crate::{
    dao::{ledger::CreditReason, notifier::NotificationKind},
    dto::scoring::{ScoringEventRequest, ScoringOutcome},
    services::achievement_service,
    state::{
        SharedState,
        achievements::{Achievement, AchievementCategory, ProgressUpdate},
    },
};

/// Dispatch one scored event: credit the tariff, advance achievement
/// progress, and fan out notifications. Ledger or notification failures never
/// surface here; they are logged and retried (or dropped) at the boundary.
pub async fn dispatch(state: &SharedState, event: ScoringEventRequest) -> ScoringOutcome {
    let tariff = state.config().tariff().clone();

    match event {
        ScoringEventRequest::VideoLiked {
            user_id,
            total_likes,
        } => {
            scored(
                state,
                user_id,
                tariff.like,
                CreditReason::VideoLiked,
                Some((
                    AchievementCategory::LikesReceived,
                    ProgressUpdate::Absolute(total_likes),
                )),
            )
            .await
        }
        ScoringEventRequest::VideoViewed {
            user_id,
            total_views,
        } => {
            scored(
                state,
                user_id,
                tariff.view,
                CreditReason::VideoViewed,
                Some((
                    AchievementCategory::ViewsReceived,
                    ProgressUpdate::Absolute(total_views),
                )),
            )
            .await
        }
        ScoringEventRequest::CommentPosted {
            user_id,
            total_comments,
        } => {
            scored(
                state,
                user_id,
                tariff.comment,
                CreditReason::CommentPosted,
                Some((
                    AchievementCategory::CommentsPosted,
                    ProgressUpdate::Absolute(total_comments),
                )),
            )
            .await
        }
        ScoringEventRequest::VideoUploaded {
            user_id,
            total_uploads,
        } => {
            scored(
                state,
                user_id,
                tariff.upload,
                CreditReason::VideoUploaded,
                Some((
                    AchievementCategory::VideosUploaded,
                    ProgressUpdate::Absolute(total_uploads),
                )),
            )
            .await
        }
        ScoringEventRequest::LikeStreakAdvanced {
            user_id,
            streak_days,
        } => {
            let completed = achievement_service::update_progress(
                state,
                user_id,
                AchievementCategory::LikeStreak,
                ProgressUpdate::Absolute(streak_days),
            )
            .await;
            outcome(0, completed)
        }
        ScoringEventRequest::DailyWinner { user_id } => {
            state
                .credit_points(user_id, tariff.daily_winner, CreditReason::DailyWinner)
                .await;
            let completed = achievement_service::grant_category_achievement(
                state,
                user_id,
                AchievementCategory::DailyWinner,
            )
            .await;
            state.notify_user(
                user_id,
                NotificationKind::DailyWinner,
                json!({ "points": tariff.daily_winner }),
            );
            outcome(tariff.daily_winner, completed)
        }
    }
}

async fn scored(
    state: &SharedState,
    user_id: Uuid,
    points: u32,
    reason: CreditReason,
    progress: Option<(AchievementCategory, ProgressUpdate)>,
) -> ScoringOutcome {
    state.credit_points(user_id, points, reason).await;

    let completed = match progress {
        Some((category, update)) => {
            achievement_service::update_progress(state, user_id, category, update).await
        }
        None => Vec::new(),
    };

    outcome(points, completed)
}

fn outcome(credited_points: u32, completed: Vec<Achievement>) -> ScoringOutcome {
    ScoringOutcome {
        credited_points,
        completed_achievements: completed.iter().map(Into::into).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::test_state;

    #[tokio::test]
    async fn a_like_credits_points_and_can_complete_a_tier() {
        let state = test_state();
        let user = Uuid::new_v4();

        let result = dispatch(
            &state,
            ScoringEventRequest::VideoLiked {
                user_id: user,
                total_likes: 10,
            },
        )
        .await;

        assert_eq!(result.credited_points, 5);
        assert_eq!(result.completed_achievements.len(), 1);
        assert_eq!(result.completed_achievements[0].title, "Bronze Likes");

        // Tariff (5) plus the bronze reward (100).
        assert_eq!(state.ledger().balance(user).await.unwrap(), 105);
    }

    #[tokio::test]
    async fn replayed_totals_do_not_double_count() {
        let state = test_state();
        let user = Uuid::new_v4();

        for _ in 0..2 {
            dispatch(
                &state,
                ScoringEventRequest::VideoUploaded {
                    user_id: user,
                    total_uploads: 1,
                },
            )
            .await;
        }

        // Two deliveries of the same total: tariff credited twice (the ledger
        // is delta-based by design), but "First Clip" completed only once.
        assert_eq!(state.ledger().balance(user).await.unwrap(), 10 + 10 + 50);
    }

    #[tokio::test]
    async fn daily_winner_grants_the_one_shot_achievement() {
        let state = test_state();
        let user = Uuid::new_v4();

        let first = dispatch(&state, ScoringEventRequest::DailyWinner { user_id: user }).await;
        assert_eq!(first.completed_achievements.len(), 1);

        let second = dispatch(&state, ScoringEventRequest::DailyWinner { user_id: user }).await;
        assert!(second.completed_achievements.is_empty());

        // Two daily payouts (100 each), one "Daily Star" reward (150).
        assert_eq!(state.ledger().balance(user).await.unwrap(), 350);
    }
}
