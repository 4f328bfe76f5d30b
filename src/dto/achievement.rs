use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::achievements::{Achievement, AchievementCategory, ProgressRecord},
};

/// One catalog entry exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AchievementSummary {
    /// Achievement identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Tracked metric.
    pub category: AchievementCategory,
    /// Completion threshold.
    pub target_value: u64,
    /// Points credited on completion.
    pub reward_points: u32,
}

/// A user's progress toward one achievement.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct UserAchievementSummary {
    /// The achievement being tracked.
    pub achievement: AchievementSummary,
    /// Current progress counter.
    pub current_progress: u64,
    /// Whether the achievement is complete.
    pub is_completed: bool,
    /// Completion timestamp (RFC3339), once completed.
    pub completed_at: Option<String>,
}

impl From<&Achievement> for AchievementSummary {
    fn from(achievement: &Achievement) -> Self {
        Self {
            id: achievement.id,
            title: achievement.title.clone(),
            category: achievement.category,
            target_value: achievement.target_value,
            reward_points: achievement.reward_points,
        }
    }
}

impl From<(Achievement, ProgressRecord)> for UserAchievementSummary {
    fn from((achievement, record): (Achievement, ProgressRecord)) -> Self {
        Self {
            achievement: (&achievement).into(),
            current_progress: record.current,
            is_completed: record.completed,
            completed_at: record.completed_at.map(format_system_time),
        }
    }
}
