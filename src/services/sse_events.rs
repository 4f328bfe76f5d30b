use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::ledger::CreditReason,
    dto::{
        battle::VideoSummary,
        format_system_time,
        phase::VisibleBattleStatus,
        sse::{
            AchievementEarnedEvent, BattleCompletedEvent, LetterChargedEvent, PointsCreditedEvent,
            ServerEvent, StatusChangedEvent, TurnChangedEvent, VideoJudgedEvent,
            VideoSubmittedEvent,
        },
    },
    state::{AppState, achievements::Achievement, battle::Battle, battle::LetterOutcome},
};

const EVENT_STATUS_CHANGED: &str = "battle.status";
const EVENT_TURN_CHANGED: &str = "battle.turn";
const EVENT_BATTLE_COMPLETED: &str = "battle.completed";
const EVENT_VIDEO_SUBMITTED: &str = "video.submitted";
const EVENT_VIDEO_JUDGED: &str = "video.judged";
const EVENT_LETTER_CHARGED: &str = "participant.letter";
const EVENT_ACHIEVEMENT_EARNED: &str = "achievement.earned";
const EVENT_POINTS_CREDITED: &str = "points.credited";

/// Broadcast a battle lifecycle status change.
pub fn broadcast_status_changed(
    state: &AppState,
    battle_id: Uuid,
    status: VisibleBattleStatus,
    winner_user_id: Option<Uuid>,
) {
    let payload = StatusChangedEvent {
        battle_id,
        status,
        winner_user_id,
    };
    send_event(state, EVENT_STATUS_CHANGED, &payload);
}

/// Broadcast the current turn pointer of a battle.
pub fn broadcast_turn_changed(state: &AppState, battle: &Battle) {
    let Some(turn) = battle.turn else {
        return;
    };
    let Some(user_id) = battle.participant_user(turn.participant_id) else {
        return;
    };

    let payload = TurnChangedEvent {
        battle_id: battle.id,
        participant_id: turn.participant_id,
        user_id,
        deadline: format_system_time(turn.deadline),
        sequence: battle.sequence,
    };
    send_event(state, EVENT_TURN_CHANGED, &payload);
}

/// Broadcast a fresh submission for the current turn.
pub fn broadcast_video_submitted(state: &AppState, battle_id: Uuid, video: VideoSummary) {
    let payload = VideoSubmittedEvent { battle_id, video };
    send_event(state, EVENT_VIDEO_SUBMITTED, &payload);
}

/// Broadcast a judge decision (or expiry) on a submission.
pub fn broadcast_video_judged(
    state: &AppState,
    battle_id: Uuid,
    video_id: Uuid,
    approved: bool,
    judge_id: Option<Uuid>,
) {
    let payload = VideoJudgedEvent {
        battle_id,
        video_id,
        approved,
        judge_id,
    };
    send_event(state, EVENT_VIDEO_JUDGED, &payload);
}

/// Broadcast a letter charged to a participant after a rejection.
pub fn broadcast_letter_charged(
    state: &AppState,
    battle_id: Uuid,
    participant_id: Uuid,
    outcome: &LetterOutcome,
) {
    let payload = LetterChargedEvent {
        battle_id,
        participant_id,
        letters: outcome.letters.clone(),
        eliminated: outcome.eliminated,
    };
    send_event(state, EVENT_LETTER_CHARGED, &payload);
}

/// Broadcast the completion of a battle.
pub fn broadcast_battle_completed(
    state: &AppState,
    battle_id: Uuid,
    winner_user_id: Uuid,
    prize_points: u32,
) {
    let payload = BattleCompletedEvent {
        battle_id,
        winner_user_id,
        prize_points,
    };
    send_event(state, EVENT_BATTLE_COMPLETED, &payload);
}

/// Broadcast a completed achievement.
pub fn broadcast_achievement_earned(state: &AppState, user_id: Uuid, achievement: &Achievement) {
    let payload = AchievementEarnedEvent {
        user_id,
        achievement: achievement.into(),
    };
    send_event(state, EVENT_ACHIEVEMENT_EARNED, &payload);
}

/// Broadcast a successful point credit.
pub fn broadcast_points_credited(
    state: &AppState,
    user_id: Uuid,
    amount: u32,
    reason: CreditReason,
) {
    let payload = PointsCreditedEvent {
        user_id,
        amount,
        reason: reason.to_string(),
    };
    send_event(state, EVENT_POINTS_CREDITED, &payload);
}

fn send_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.events().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
