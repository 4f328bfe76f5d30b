//! Submission and judgment pipeline: accepts exactly one submission per turn
//! and resolves it through a judge decision, driving the turn scheduler
//! forward on every outcome.

use std::time::SystemTime;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::notifier::NotificationKind,
    dto::battle::{BattleSummary, SubmitVideoRequest},
    error::ServiceError,
    services::{finalizer, scheduler, sse_events},
    state::{
        SharedState,
        battle::{BattleError, BattleVideo, Verdict},
    },
};

/// Accept a video for the active turn.
///
/// All checks run against the authoritative stored turn pointer while holding
/// the battle lock, so a submission racing a deadline expiry either lands
/// before the turn advances or fails with [`BattleError::NotYourTurn`].
pub async fn submit_video(
    state: &SharedState,
    battle_id: Uuid,
    acting_user: Uuid,
    request: SubmitVideoRequest,
) -> Result<BattleSummary, ServiceError> {
    let room = state.room(battle_id)?;
    let mut guard = room.lock().await;

    guard.ensure_active()?;

    let battle = &mut guard.battle;
    let turn = battle.turn.ok_or(BattleError::BattleNotActive)?;

    let participant_id = battle
        .participants
        .values()
        .find(|participant| participant.user_id == acting_user)
        .map(|participant| participant.id)
        .ok_or(BattleError::NotYourTurn)?;

    if participant_id != turn.participant_id {
        return Err(BattleError::NotYourTurn.into());
    }

    let now = SystemTime::now();
    if now > turn.deadline {
        return Err(BattleError::DeadlineExpired.into());
    }

    if battle.pending_video_for_sequence(battle.sequence).is_some() {
        return Err(BattleError::DuplicateSubmission.into());
    }

    let video = BattleVideo {
        id: Uuid::new_v4(),
        participant_id,
        sequence: battle.sequence,
        url: request.url,
        title: request.title,
        verdict: None,
        submitted_at: now,
    };
    battle.videos.push(video.clone());
    battle.updated_at = now;

    info!(%battle_id, %participant_id, sequence = video.sequence, "video submitted");
    sse_events::broadcast_video_submitted(state, battle_id, (&video).into());

    Ok((&*guard).into())
}

/// Resolve a pending submission with a judge decision.
///
/// The verdict write is a compare-and-set on the tri-state field: only a
/// `None` verdict can be decided, so a double-click or a second judge loses
/// with [`BattleError::AlreadyJudged`].
pub async fn judge_decision(
    state: &SharedState,
    battle_id: Uuid,
    video_id: Uuid,
    acting_user: Uuid,
    approve: bool,
) -> Result<BattleSummary, ServiceError> {
    if !state.is_judge(battle_id, acting_user).await {
        return Err(BattleError::NotAJudge.into());
    }

    let room = state.room(battle_id)?;
    let mut guard = room.lock().await;

    guard.ensure_active()?;

    let now = SystemTime::now();
    let (participant_id, submitter) = {
        let battle = &mut guard.battle;
        let video = battle
            .video_mut(video_id)
            .ok_or_else(|| ServiceError::NotFound(format!("video `{video_id}` not found")))?;

        if video.verdict.is_some() {
            return Err(BattleError::AlreadyJudged.into());
        }

        let participant_id = video.participant_id;
        if approve {
            video.verdict = Some(Verdict::Approved {
                judge_id: acting_user,
                at: now,
            });
            let (url, title) = (video.url.clone(), video.title.clone());
            battle.set_reference(url, title);
            battle.sequence += 1;
        } else {
            video.verdict = Some(Verdict::Rejected {
                judge_id: Some(acting_user),
                at: now,
            });
        }

        (participant_id, battle.participant_user(participant_id))
    };

    info!(%battle_id, %video_id, approve, judge = %acting_user, "submission judged");
    sse_events::broadcast_video_judged(state, battle_id, video_id, approve, Some(acting_user));
    if let Some(user_id) = submitter {
        state.notify_user(
            user_id,
            NotificationKind::SubmissionJudged,
            json!({ "battle_id": battle_id, "video_id": video_id, "approved": approve }),
        );
    }

    if approve {
        if scheduler::assign_next_turn(state, &mut guard.battle, Some(participant_id)).is_none() {
            finalizer::check_for_winner(state, &mut guard).await?;
        }
    } else {
        scheduler::resolve_rejection(state, &mut guard, participant_id).await?;
    }

    Ok((&*guard).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::services::testutil::{started_battle, submit_request, test_state};
    use crate::state::battle::ParticipantStatus;
    use crate::state::state_machine::BattlePhase;

    async fn current_turn_user(state: &SharedState, battle_id: Uuid) -> Uuid {
        let room = state.room(battle_id).unwrap();
        let guard = room.lock().await;
        let turn = guard.battle.turn.unwrap();
        guard.battle.participant_user(turn.participant_id).unwrap()
    }

    async fn latest_video_id(state: &SharedState, battle_id: Uuid) -> Uuid {
        let room = state.room(battle_id).unwrap();
        let guard = room.lock().await;
        guard.battle.videos.last().unwrap().id
    }

    #[tokio::test]
    async fn approve_round_trip_updates_reference_and_sequence() {
        let state = test_state();
        let (battle_id, organizer, _) = started_battle(&state, 3).await;

        let rider = current_turn_user(&state, battle_id).await;
        submit_video(
            &state,
            battle_id,
            rider,
            submit_request("https://clips.example/next.mp4", "kickflip"),
        )
        .await
        .unwrap();

        let video_id = latest_video_id(&state, battle_id).await;
        let summary = judge_decision(&state, battle_id, video_id, organizer, true)
            .await
            .unwrap();

        assert_eq!(summary.reference_video.url, "https://clips.example/next.mp4");
        assert_eq!(summary.sequence, 2);
        // The turn rotated away from the approved rider.
        assert_ne!(summary.turn.unwrap().user_id, rider);
    }

    #[tokio::test]
    async fn submitting_out_of_turn_is_refused() {
        let state = test_state();
        let (battle_id, _, users) = started_battle(&state, 3).await;

        let holder = current_turn_user(&state, battle_id).await;
        let other = users.iter().copied().find(|user| *user != holder).unwrap();

        let err = submit_video(
            &state,
            battle_id,
            other,
            submit_request("https://clips.example/late.mp4", "heelflip"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::NotYourTurn)
        ));
    }

    #[tokio::test]
    async fn duplicate_submission_for_one_turn_is_refused() {
        let state = test_state();
        let (battle_id, _, _) = started_battle(&state, 2).await;

        let rider = current_turn_user(&state, battle_id).await;
        submit_video(
            &state,
            battle_id,
            rider,
            submit_request("https://clips.example/a.mp4", "first"),
        )
        .await
        .unwrap();

        let err = submit_video(
            &state,
            battle_id,
            rider,
            submit_request("https://clips.example/b.mp4", "second"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::DuplicateSubmission)
        ));
    }

    #[tokio::test]
    async fn submission_past_the_deadline_is_refused() {
        let state = test_state();
        let (battle_id, _, _) = started_battle(&state, 2).await;

        let rider = current_turn_user(&state, battle_id).await;
        {
            let room = state.room(battle_id).unwrap();
            let mut guard = room.lock().await;
            let turn = guard.battle.turn.as_mut().unwrap();
            turn.deadline = SystemTime::now() - Duration::from_secs(1);
        }

        let err = submit_video(
            &state,
            battle_id,
            rider,
            submit_request("https://clips.example/late.mp4", "too late"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::DeadlineExpired)
        ));
    }

    #[tokio::test]
    async fn double_judgment_is_refused() {
        let state = test_state();
        let (battle_id, organizer, _) = started_battle(&state, 3).await;

        let rider = current_turn_user(&state, battle_id).await;
        submit_video(
            &state,
            battle_id,
            rider,
            submit_request("https://clips.example/a.mp4", "first"),
        )
        .await
        .unwrap();
        let video_id = latest_video_id(&state, battle_id).await;

        judge_decision(&state, battle_id, video_id, organizer, true)
            .await
            .unwrap();
        let err = judge_decision(&state, battle_id, video_id, organizer, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::AlreadyJudged)
        ));
    }

    #[tokio::test]
    async fn non_judges_cannot_decide() {
        let state = test_state();
        let (battle_id, _, users) = started_battle(&state, 2).await;

        let rider = current_turn_user(&state, battle_id).await;
        submit_video(
            &state,
            battle_id,
            rider,
            submit_request("https://clips.example/a.mp4", "first"),
        )
        .await
        .unwrap();
        let video_id = latest_video_id(&state, battle_id).await;

        let outsider = users[0];
        let err = judge_decision(&state, battle_id, video_id, outsider, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Battle(BattleError::NotAJudge)));
    }

    #[tokio::test]
    async fn four_rejections_eliminate_a_rider() {
        let state = test_state();
        let (battle_id, organizer, _) = started_battle(&state, 3).await;

        let room = state.room(battle_id).unwrap();
        let victim = {
            let guard = room.lock().await;
            guard.battle.turn.unwrap().participant_id
        };
        let victim_user = {
            let guard = room.lock().await;
            guard.battle.participant_user(victim).unwrap()
        };

        // Rejections land on the victim's own turns; other riders' turns are
        // approved to keep the rotation moving.
        let mut victim_rejections = 0;
        while victim_rejections < 4 {
            let rider = current_turn_user(&state, battle_id).await;
            submit_video(
                &state,
                battle_id,
                rider,
                submit_request("https://clips.example/turn.mp4", "trick"),
            )
            .await
            .unwrap();
            let video_id = latest_video_id(&state, battle_id).await;

            let approve = rider != victim_user;
            judge_decision(&state, battle_id, video_id, organizer, approve)
                .await
                .unwrap();
            if !approve {
                victim_rejections += 1;
            }
        }

        let guard = room.lock().await;
        let participant = &guard.battle.participants[&victim];
        assert_eq!(participant.letters, "FULL");
        assert_eq!(participant.status, ParticipantStatus::Eliminated);
        // Two riders remain active, so the battle keeps going.
        assert_eq!(guard.phase(), BattlePhase::Active);
        assert_ne!(guard.battle.turn.unwrap().participant_id, victim);
    }

    #[tokio::test]
    async fn eliminating_the_last_rival_completes_the_battle() {
        let state = test_state();
        let (battle_id, organizer, _) = started_battle(&state, 2).await;

        let room = state.room(battle_id).unwrap();
        let victim_user = current_turn_user(&state, battle_id).await;

        let mut victim_rejections = 0;
        while victim_rejections < 4 {
            let rider = current_turn_user(&state, battle_id).await;
            submit_video(
                &state,
                battle_id,
                rider,
                submit_request("https://clips.example/turn.mp4", "trick"),
            )
            .await
            .unwrap();
            let video_id = latest_video_id(&state, battle_id).await;

            let approve = rider != victim_user;
            judge_decision(&state, battle_id, video_id, organizer, approve)
                .await
                .unwrap();
            if !approve {
                victim_rejections += 1;
            }
        }

        let guard = room.lock().await;
        assert_eq!(guard.phase(), BattlePhase::Completed);

        let winner = guard.battle.winner_user_id.unwrap();
        assert_ne!(winner, victim_user);
        assert!(guard.battle.turn.is_none());
        drop(guard);

        // Prize (500) plus the "First Win" achievement reward (300).
        let balance = state.ledger().balance(winner).await.unwrap();
        assert_eq!(balance, 800);

        let wins_progress = crate::services::achievement_service::progress_for_user(&state, winner)
            .into_iter()
            .find(|entry| entry.achievement.title == "First Win")
            .unwrap();
        assert!(wins_progress.is_completed);
    }

    #[tokio::test]
    async fn late_submission_after_expiry_advanced_the_turn_is_refused() {
        let state = test_state();
        let (battle_id, _, _) = started_battle(&state, 3).await;

        let room = state.room(battle_id).unwrap();
        let (first_user, deadline) = {
            let guard = room.lock().await;
            let turn = guard.battle.turn.unwrap();
            (
                guard.battle.participant_user(turn.participant_id).unwrap(),
                turn.deadline,
            )
        };

        // The expiry handler wins the race and advances the turn.
        crate::services::scheduler::handle_deadline_expiry_at(
            &state,
            battle_id,
            deadline + Duration::from_secs(1),
        )
        .await
        .unwrap();

        // The original rider's submission arrives just after.
        let err = submit_video(
            &state,
            battle_id,
            first_user,
            submit_request("https://clips.example/late.mp4", "just missed"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::NotYourTurn)
        ));
    }
}
