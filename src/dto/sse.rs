use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    achievement::AchievementSummary, battle::VideoSummary, phase::VisibleBattleStatus,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized event data.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from a name and a plain string payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a battle's lifecycle status changes.
pub struct StatusChangedEvent {
    /// Battle whose status changed.
    pub battle_id: Uuid,
    /// New status.
    pub status: VisibleBattleStatus,
    /// Winner, present once the battle completes.
    pub winner_user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the turn pointer moves to another participant.
pub struct TurnChangedEvent {
    /// Battle the turn belongs to.
    pub battle_id: Uuid,
    /// Participant now holding the turn.
    pub participant_id: Uuid,
    /// User behind the participant.
    pub user_id: Uuid,
    /// Turn deadline (RFC3339).
    pub deadline: String,
    /// Turn sequence number.
    pub sequence: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a participant submits a video for the current turn.
pub struct VideoSubmittedEvent {
    /// Battle the submission belongs to.
    pub battle_id: Uuid,
    /// The submission.
    pub video: VideoSummary,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a submission is approved, rejected, or expires.
pub struct VideoJudgedEvent {
    /// Battle the submission belongs to.
    pub battle_id: Uuid,
    /// The judged submission.
    pub video_id: Uuid,
    /// Whether it was approved.
    pub approved: bool,
    /// Judge who decided; absent for a deadline expiry.
    pub judge_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a rejection charges a letter to a participant.
pub struct LetterChargedEvent {
    /// Battle the participant belongs to.
    pub battle_id: Uuid,
    /// Participant who collected the letter.
    pub participant_id: Uuid,
    /// Letters collected so far.
    pub letters: String,
    /// Whether the word is now complete.
    pub eliminated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a battle completes with a winner.
pub struct BattleCompletedEvent {
    /// Completed battle.
    pub battle_id: Uuid,
    /// Winning user.
    pub winner_user_id: Uuid,
    /// Prize credited to the winner.
    pub prize_points: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a user completes an achievement.
pub struct AchievementEarnedEvent {
    /// User who completed the achievement.
    pub user_id: Uuid,
    /// The completed achievement.
    pub achievement: AchievementSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when points are credited to a user.
pub struct PointsCreditedEvent {
    /// Credited user.
    pub user_id: Uuid,
    /// Amount of points.
    pub amount: u32,
    /// Credit reason label.
    pub reason: String,
}
