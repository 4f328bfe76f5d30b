//! Achievement progress engine. Every scored event funnels through
//! [`update_progress`], which walks all active achievements of a category in
//! one pass so tiered thresholds (bronze/silver/gold) complete independently.

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{ledger::CreditReason, notifier::NotificationKind},
    dto::achievement::UserAchievementSummary,
    services::sse_events,
    state::{
        SharedState,
        achievements::{Achievement, AchievementCategory, ProgressUpdate},
    },
};

/// Move a user's progress in `category` forward and handle any completions.
///
/// Completion flips exactly once per achievement: the reward is credited, a
/// notification goes out, and an event is broadcast. Re-applying the same (or
/// a smaller) absolute value is a no-op. Returns the achievements completed by
/// this call.
pub async fn update_progress(
    state: &SharedState,
    user_id: Uuid,
    category: AchievementCategory,
    update: ProgressUpdate,
) -> Vec<Achievement> {
    let achievements: Vec<Achievement> = state
        .achievements()
        .in_category(category)
        .cloned()
        .collect();

    let mut completed = Vec::new();
    for achievement in achievements {
        let outcome = state.achievements().apply(user_id, &achievement, update);
        if !outcome.completed_now {
            continue;
        }

        info!(
            %user_id,
            achievement = %achievement.title,
            progress = outcome.current,
            target = achievement.target_value,
            "achievement completed"
        );

        state
            .credit_points(
                user_id,
                achievement.reward_points,
                CreditReason::AchievementReward,
            )
            .await;
        state.notify_user(
            user_id,
            NotificationKind::AchievementEarned,
            json!({
                "achievement_id": achievement.id,
                "title": achievement.title,
            }),
        );
        sse_events::broadcast_achievement_earned(state, user_id, &achievement);

        completed.push(achievement);
    }

    completed
}

/// One-shot grant for categories whose achievements complete on the first
/// qualifying action. Drives every achievement of the category straight to
/// its threshold; safe to call any number of times because completed
/// achievements are skipped by max() semantics.
pub async fn grant_category_achievement(
    state: &SharedState,
    user_id: Uuid,
    category: AchievementCategory,
) -> Vec<Achievement> {
    let targets: Vec<u64> = state
        .achievements()
        .in_category(category)
        .map(|achievement| achievement.target_value)
        .collect();
    let Some(ceiling) = targets.into_iter().max() else {
        return Vec::new();
    };

    update_progress(state, user_id, category, ProgressUpdate::Absolute(ceiling)).await
}

/// Progress snapshot for one user across the whole catalog.
pub fn progress_for_user(state: &SharedState, user_id: Uuid) -> Vec<UserAchievementSummary> {
    state
        .achievements()
        .progress_for(user_id)
        .into_iter()
        .map(Into::into)
        .collect()
}
