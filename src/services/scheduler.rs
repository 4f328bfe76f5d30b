//! Battle turn scheduler: owns the "whose turn is it" pointer and its
//! deadline, and converts expired deadlines into implicit rejections.

use std::time::SystemTime;

use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::notifier::NotificationKind,
    dto::{battle::BattleSummary, format_system_time},
    error::ServiceError,
    services::{finalizer, sse_events},
    state::{
        BattleRoom, SharedState,
        battle::{Battle, Verdict},
        state_machine::BattlePhase,
    },
};

/// Rotate the turn to the next active participant, excluding the one whose
/// submission just resolved. Returns the chosen participant, or `None` when no
/// other active rider exists, in which case the caller must finalize instead
/// of treating it as a scheduling error.
pub fn assign_next_turn(
    state: &SharedState,
    battle: &mut Battle,
    resolved: Option<Uuid>,
) -> Option<Uuid> {
    let next = battle.next_participant_after(resolved)?;
    let now = SystemTime::now();
    battle.begin_turn(next, now);

    sse_events::broadcast_turn_changed(state, battle);
    if let Some(user_id) = battle.participant_user(next) {
        let deadline = battle.turn.map(|turn| format_system_time(turn.deadline));
        state.notify_user(
            user_id,
            NotificationKind::TurnStarted,
            json!({ "battle_id": battle.id, "deadline": deadline }),
        );
    }

    Some(next)
}

/// Shared tail of every rejection (judged or expired): charge the letter,
/// then check for a winner, then rotate the turn. The letter is recorded
/// before the winner check so an elimination is never lost to a concurrent
/// finalization.
pub(crate) async fn resolve_rejection(
    state: &SharedState,
    room: &mut BattleRoom,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let word = state.config().elimination_word().to_string();
    let outcome = room.battle.charge_letter(participant_id, &word);
    sse_events::broadcast_letter_charged(state, room.battle.id, participant_id, &outcome);

    if outcome.eliminated {
        if let Some(user_id) = room.battle.participant_user(participant_id) {
            state.notify_user(
                user_id,
                NotificationKind::Eliminated,
                json!({ "battle_id": room.battle.id, "letters": outcome.letters }),
            );
        }
    }

    if finalizer::check_for_winner(state, room).await? {
        return Ok(());
    }

    if assign_next_turn(state, &mut room.battle, Some(participant_id)).is_none() {
        finalizer::check_for_winner(state, room).await?;
    }

    Ok(())
}

/// Treat an expired turn as an implicit rejection.
///
/// Safe to call redundantly: once the turn has advanced (or the battle left
/// the active phase) the call is a no-op returning the current battle state.
pub async fn handle_deadline_expiry(
    state: &SharedState,
    battle_id: Uuid,
) -> Result<BattleSummary, ServiceError> {
    handle_deadline_expiry_at(state, battle_id, SystemTime::now()).await
}

pub(crate) async fn handle_deadline_expiry_at(
    state: &SharedState,
    battle_id: Uuid,
    now: SystemTime,
) -> Result<BattleSummary, ServiceError> {
    let room = state.room(battle_id)?;
    let mut guard = room.lock().await;

    if guard.phase() != BattlePhase::Active {
        return Ok((&*guard).into());
    }

    let Some(turn) = guard.battle.turn else {
        return Ok((&*guard).into());
    };

    if now < turn.deadline {
        return Ok((&*guard).into());
    }

    // An unjudged submission for the expiring turn is rejected with no judge
    // attributed.
    let sequence = guard.battle.sequence;
    let pending = guard
        .battle
        .pending_video_for_sequence(sequence)
        .map(|video| video.id);
    if let Some(video_id) = pending {
        if let Some(video) = guard.battle.video_mut(video_id) {
            video.verdict = Some(Verdict::Rejected {
                judge_id: None,
                at: now,
            });
        }
        sse_events::broadcast_video_judged(state, battle_id, video_id, false, None);
    }

    debug!(%battle_id, participant = %turn.participant_id, "turn deadline expired");
    resolve_rejection(state, &mut guard, turn.participant_id).await?;

    Ok((&*guard).into())
}

/// Periodically scan every battle for expired turn deadlines. The REST
/// trigger stays available for external schedulers; both paths converge on
/// [`handle_deadline_expiry`], which tolerates redundant invocations.
pub async fn run_sweeper(state: SharedState) {
    let interval = state.config().sweep_interval();

    loop {
        sleep(interval).await;

        for battle_id in state.battle_ids() {
            if let Err(err) = handle_deadline_expiry(&state, battle_id).await {
                warn!(%battle_id, error = %err, "deadline sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::services::testutil::{started_battle, test_state};
    use crate::state::battle::ParticipantStatus;

    #[tokio::test]
    async fn expiry_charges_a_letter_and_rotates() {
        let state = test_state();
        let (battle_id, _, _) = started_battle(&state, 3).await;

        let room = state.room(battle_id).unwrap();
        let (first, deadline) = {
            let guard = room.lock().await;
            let turn = guard.battle.turn.unwrap();
            (turn.participant_id, turn.deadline)
        };

        let past_due = deadline + Duration::from_secs(1);
        handle_deadline_expiry_at(&state, battle_id, past_due)
            .await
            .unwrap();

        let guard = room.lock().await;
        assert_eq!(guard.battle.participants[&first].letters, "F");
        let turn = guard.battle.turn.unwrap();
        assert_ne!(turn.participant_id, first);
    }

    #[tokio::test]
    async fn expiry_is_idempotent() {
        let state = test_state();
        let (battle_id, _, _) = started_battle(&state, 3).await;

        let room = state.room(battle_id).unwrap();
        let (first, deadline) = {
            let guard = room.lock().await;
            let turn = guard.battle.turn.unwrap();
            (turn.participant_id, turn.deadline)
        };

        let past_due = deadline + Duration::from_secs(1);
        handle_deadline_expiry_at(&state, battle_id, past_due)
            .await
            .unwrap();
        // The second invocation sees a fresh deadline and changes nothing.
        handle_deadline_expiry_at(&state, battle_id, past_due)
            .await
            .unwrap();

        let guard = room.lock().await;
        assert_eq!(guard.battle.participants[&first].letters, "F");
        for participant in guard.battle.participants.values() {
            if participant.id != first {
                assert_eq!(participant.letters, "");
            }
        }
    }

    #[tokio::test]
    async fn repeated_expiries_eliminate_and_finalize() {
        let state = test_state();
        let (battle_id, _, users) = started_battle(&state, 2).await;

        let room = state.room(battle_id).unwrap();

        // Expire every turn; letters alternate between the two riders until
        // one of them completes the word and the battle finalizes.
        for _ in 0..16 {
            let deadline = {
                let guard = room.lock().await;
                match guard.battle.turn {
                    Some(turn) => turn.deadline,
                    None => break,
                }
            };
            handle_deadline_expiry_at(&state, battle_id, deadline + Duration::from_secs(1))
                .await
                .unwrap();
        }

        let guard = room.lock().await;
        assert_eq!(guard.phase(), BattlePhase::Completed);
        assert!(guard.battle.turn.is_none());

        let winner = guard.battle.winner_user_id.unwrap();
        assert!(users.contains(&winner));

        let eliminated = guard
            .battle
            .participants
            .values()
            .find(|participant| participant.status == ParticipantStatus::Eliminated)
            .unwrap();
        assert_eq!(eliminated.letters, "FULL");
        assert_ne!(eliminated.user_id, winner);
    }
}
