use std::time::SystemTime;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Grouping key under which one or more tiered achievements track the same
/// underlying metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    /// Total likes received across a user's videos.
    LikesReceived,
    /// Total views received across a user's videos.
    ViewsReceived,
    /// Battles won.
    Wins,
    /// Videos uploaded to the feed.
    VideosUploaded,
    /// Consecutive days with at least one like given.
    LikeStreak,
    /// Comments posted on other riders' videos.
    CommentsPosted,
    /// Daily-winner contest victories (one-shot grant).
    DailyWinner,
}

/// One achievement definition from the catalog.
#[derive(Debug, Clone)]
pub struct Achievement {
    /// Stable identifier.
    pub id: Uuid,
    /// Display title (e.g. "Bronze Likes").
    pub title: String,
    /// Metric the achievement tracks.
    pub category: AchievementCategory,
    /// Threshold at which the achievement completes.
    pub target_value: u64,
    /// Points credited on completion.
    pub reward_points: u32,
    /// Inactive achievements are kept for history but never progressed.
    pub is_active: bool,
}

/// Per-user progress toward one achievement.
#[derive(Debug, Clone, Default)]
pub struct ProgressRecord {
    /// Monotonically non-decreasing progress counter.
    pub current: u64,
    /// Flips exactly once; never reverts.
    pub completed: bool,
    /// Stamped when `completed` flips.
    pub completed_at: Option<SystemTime>,
}

/// How to move a progress counter forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Set progress to `max(current, value)`; recomputed totals from the
    /// source of truth land here, so replays are harmless.
    Absolute(u64),
    /// Add to the current progress.
    Increment(u64),
}

/// Result of applying one update against one achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOutcome {
    /// Progress counter after the update.
    pub current: u64,
    /// Whether the achievement is complete after the update.
    pub completed: bool,
    /// True only on the single call that crossed the threshold.
    pub completed_now: bool,
}

/// Catalog of achievements plus every user's progress, with atomic updates.
///
/// Progress entries are mutated through the map's entry API so two events for
/// the same (user, achievement) pair serialize instead of losing an update.
pub struct AchievementBoard {
    catalog: Vec<Achievement>,
    progress: DashMap<(Uuid, Uuid), ProgressRecord>,
}

impl AchievementBoard {
    /// Build a board from the configured catalog.
    pub fn new(catalog: Vec<Achievement>) -> Self {
        Self {
            catalog,
            progress: DashMap::new(),
        }
    }

    /// Full catalog, inactive entries included.
    pub fn catalog(&self) -> &[Achievement] {
        &self.catalog
    }

    /// Active achievements tracking `category`.
    pub fn in_category(
        &self,
        category: AchievementCategory,
    ) -> impl Iterator<Item = &Achievement> {
        self.catalog
            .iter()
            .filter(move |achievement| achievement.is_active && achievement.category == category)
    }

    /// Progress snapshot for one user across the whole catalog.
    pub fn progress_for(&self, user_id: Uuid) -> Vec<(Achievement, ProgressRecord)> {
        self.catalog
            .iter()
            .map(|achievement| {
                let record = self
                    .progress
                    .get(&(user_id, achievement.id))
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default();
                (achievement.clone(), record)
            })
            .collect()
    }

    /// Apply one update to one (user, achievement) pair.
    ///
    /// Absolute updates use max() semantics so a stale or replayed total can
    /// never decrease progress or re-trigger the completion reward.
    pub fn apply(
        &self,
        user_id: Uuid,
        achievement: &Achievement,
        update: ProgressUpdate,
    ) -> ProgressOutcome {
        let mut entry = self
            .progress
            .entry((user_id, achievement.id))
            .or_default();

        match update {
            ProgressUpdate::Absolute(value) => {
                if value > entry.current {
                    entry.current = value;
                }
            }
            ProgressUpdate::Increment(amount) => {
                entry.current = entry.current.saturating_add(amount);
            }
        }

        let completed_now = !entry.completed && entry.current >= achievement.target_value;
        if completed_now {
            entry.completed = true;
            entry.completed_at = Some(SystemTime::now());
        }

        ProgressOutcome {
            current: entry.current,
            completed: entry.completed,
            completed_now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiered_board() -> (AchievementBoard, Uuid, Uuid) {
        let bronze = Achievement {
            id: Uuid::new_v4(),
            title: "Bronze Likes".into(),
            category: AchievementCategory::LikesReceived,
            target_value: 10,
            reward_points: 100,
            is_active: true,
        };
        let silver = Achievement {
            id: Uuid::new_v4(),
            title: "Silver Likes".into(),
            category: AchievementCategory::LikesReceived,
            target_value: 50,
            reward_points: 250,
            is_active: true,
        };
        let (bronze_id, silver_id) = (bronze.id, silver.id);
        (AchievementBoard::new(vec![bronze, silver]), bronze_id, silver_id)
    }

    #[test]
    fn absolute_updates_never_decrease_progress() {
        let (board, bronze_id, _) = tiered_board();
        let user = Uuid::new_v4();
        let bronze = board.catalog()[0].clone();
        assert_eq!(bronze.id, bronze_id);

        board.apply(user, &bronze, ProgressUpdate::Absolute(7));
        let outcome = board.apply(user, &bronze, ProgressUpdate::Absolute(3));

        assert_eq!(outcome.current, 7);
        assert!(!outcome.completed);
    }

    #[test]
    fn threshold_crossing_reports_completed_now_once() {
        let (board, ..) = tiered_board();
        let user = Uuid::new_v4();
        let bronze = board.catalog()[0].clone();

        let first = board.apply(user, &bronze, ProgressUpdate::Absolute(10));
        assert!(first.completed_now);
        assert!(first.completed);

        // Replaying the same total must not re-complete.
        let replay = board.apply(user, &bronze, ProgressUpdate::Absolute(10));
        assert!(!replay.completed_now);
        assert!(replay.completed);
    }

    #[test]
    fn tiers_complete_independently() {
        let (board, _, silver_id) = tiered_board();
        let user = Uuid::new_v4();

        let outcomes: Vec<_> = board
            .in_category(AchievementCategory::LikesReceived)
            .map(|achievement| (achievement.clone(), ProgressUpdate::Absolute(10)))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(achievement, update)| (achievement.id, board.apply(user, &achievement, update)))
            .collect();

        let silver = outcomes
            .iter()
            .find(|(id, _)| *id == silver_id)
            .map(|(_, outcome)| outcome)
            .unwrap();
        assert!(!silver.completed);

        for (_, outcome) in outcomes.iter().filter(|(id, _)| *id != silver_id) {
            assert!(outcome.completed_now);
        }
    }

    #[test]
    fn increments_accumulate() {
        let (board, ..) = tiered_board();
        let user = Uuid::new_v4();
        let bronze = board.catalog()[0].clone();

        for _ in 0..9 {
            let outcome = board.apply(user, &bronze, ProgressUpdate::Increment(1));
            assert!(!outcome.completed);
        }

        let outcome = board.apply(user, &bronze, ProgressUpdate::Increment(1));
        assert_eq!(outcome.current, 10);
        assert!(outcome.completed_now);
    }
}
