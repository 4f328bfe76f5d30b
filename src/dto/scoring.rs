use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::achievement::AchievementSummary;

/// A scored feed event reported by the wider application.
///
/// Events carry the *new total* of the underlying metric, not a delta, so the
/// achievement engine can re-derive progress idempotently when an event is
/// replayed or retried.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringEventRequest {
    /// A video owned by `user_id` received a like.
    VideoLiked {
        /// Video owner.
        user_id: Uuid,
        /// Total likes across the owner's videos after this like.
        total_likes: u64,
    },
    /// A video owned by `user_id` was viewed.
    VideoViewed {
        /// Video owner.
        user_id: Uuid,
        /// Total views across the owner's videos after this view.
        total_views: u64,
    },
    /// `user_id` posted a comment.
    CommentPosted {
        /// Comment author.
        user_id: Uuid,
        /// Total comments the author has posted.
        total_comments: u64,
    },
    /// `user_id` uploaded a video.
    VideoUploaded {
        /// Uploader.
        user_id: Uuid,
        /// Total videos the user has uploaded.
        total_uploads: u64,
    },
    /// `user_id`'s like streak advanced.
    LikeStreakAdvanced {
        /// Streak owner.
        user_id: Uuid,
        /// Length of the current streak in days.
        streak_days: u64,
    },
    /// `user_id` won the daily contest.
    DailyWinner {
        /// Daily winner.
        user_id: Uuid,
    },
}

/// Result of dispatching one scored event.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoringOutcome {
    /// Tariff points credited for this event.
    pub credited_points: u32,
    /// Achievements that completed because of this event.
    pub completed_achievements: Vec<AchievementSummary>,
}
