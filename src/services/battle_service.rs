//! Battle lifecycle operations: creation, registration, start, cancellation,
//! declared winners, and read-only projections.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        battle::{
            BattleListItem, BattleSummary, CreateBattleRequest, DeclareWinnerRequest,
            JoinBattleRequest,
        },
        phase::VisibleBattleStatus,
    },
    error::ServiceError,
    services::{finalizer, scheduler, sse_events},
    state::{
        BattleRoom, CompletionReason, SharedState,
        battle::{Battle, BattleError, ParticipantStatus, ReferenceVideo},
        state_machine::{BattleEvent, BattlePhase},
    },
};

/// Create a battle and register its judge roster. The organizer always
/// belongs to the roster.
pub async fn create_battle(
    state: &SharedState,
    organizer_id: Uuid,
    request: CreateBattleRequest,
) -> Result<BattleSummary, ServiceError> {
    let CreateBattleRequest {
        title,
        description,
        reference_url,
        reference_title,
        prize_points,
        turn_limit_minutes,
        judges,
    } = request;

    let turn_limit = turn_limit_minutes
        .map(|minutes| Duration::from_secs(minutes * 60))
        .unwrap_or_else(|| state.config().default_turn_limit());

    let battle = Battle::new(
        title,
        description.filter(|text| !text.trim().is_empty()),
        organizer_id,
        ReferenceVideo {
            url: reference_url,
            title: reference_title,
        },
        prize_points,
        turn_limit,
    );
    let battle_id = battle.id;

    let mut roster: HashSet<Uuid> = judges.into_iter().collect();
    roster.insert(organizer_id);
    state
        .register_judges(battle_id, roster.into_iter().collect())
        .await;

    let handle = state.insert_room(BattleRoom::new(battle));
    info!(%battle_id, %organizer_id, "battle created");

    let guard = handle.lock().await;
    Ok((&*guard).into())
}

/// Register the acting user as a participant while the battle is open.
pub async fn join_battle(
    state: &SharedState,
    battle_id: Uuid,
    user_id: Uuid,
    request: JoinBattleRequest,
) -> Result<BattleSummary, ServiceError> {
    let room = state.room(battle_id)?;
    let mut guard = room.lock().await;

    if guard.phase() != BattlePhase::Registration {
        return Err(ServiceError::InvalidState(
            "registration is closed for this battle".into(),
        ));
    }

    guard.battle.join(user_id, request.display_name)?;
    info!(%battle_id, %user_id, "participant joined");

    Ok((&*guard).into())
}

/// Start the battle and hand the first turn to the earliest joiner.
pub async fn start_battle(
    state: &SharedState,
    battle_id: Uuid,
    acting_user: Uuid,
) -> Result<BattleSummary, ServiceError> {
    let room = state.room(battle_id)?;
    let mut guard = room.lock().await;

    if guard.battle.organizer_id != acting_user {
        return Err(ServiceError::Unauthorized(
            "only the organizer can start the battle".into(),
        ));
    }

    if guard.battle.active_count() < 2 {
        return Err(BattleError::InsufficientParticipants.into());
    }

    guard.run_transition(BattleEvent::Start, |battle| {
        let now = SystemTime::now();
        battle.started_at = Some(now);
        battle.sequence = 1;
        battle.updated_at = now;
        Ok(())
    })?;

    info!(%battle_id, "battle started");
    sse_events::broadcast_status_changed(state, battle_id, VisibleBattleStatus::Active, None);
    scheduler::assign_next_turn(state, &mut guard.battle, None);

    Ok((&*guard).into())
}

/// Cancel the battle before completion. In-flight submissions and judgments
/// observe the phase change and fail with `BattleNotActive`.
pub async fn cancel_battle(
    state: &SharedState,
    battle_id: Uuid,
    acting_user: Uuid,
) -> Result<BattleSummary, ServiceError> {
    let room = state.room(battle_id)?;
    let mut guard = room.lock().await;

    if guard.battle.organizer_id != acting_user {
        return Err(ServiceError::Unauthorized(
            "only the organizer can cancel the battle".into(),
        ));
    }

    guard.run_transition(BattleEvent::Cancel, |battle| {
        battle.clear_turn();
        Ok(())
    })?;

    info!(%battle_id, "battle cancelled");
    sse_events::broadcast_status_changed(state, battle_id, VisibleBattleStatus::Cancelled, None);

    Ok((&*guard).into())
}

/// Declare a winner outright, ending the battle immediately.
pub async fn declare_winner(
    state: &SharedState,
    battle_id: Uuid,
    acting_user: Uuid,
    request: DeclareWinnerRequest,
) -> Result<BattleSummary, ServiceError> {
    let is_judge = state.is_judge(battle_id, acting_user).await;

    let room = state.room(battle_id)?;
    let mut guard = room.lock().await;

    if !is_judge && guard.battle.organizer_id != acting_user {
        return Err(BattleError::NotAJudge.into());
    }

    guard.ensure_active()?;

    let winner_user = request.winner_user_id;
    let is_active_participant = guard
        .battle
        .participants
        .values()
        .any(|participant| {
            participant.user_id == winner_user
                && participant.status == ParticipantStatus::Active
        });
    if !is_active_participant {
        return Err(ServiceError::InvalidInput(
            "winner must be an active participant of this battle".into(),
        ));
    }

    finalizer::complete_battle(state, &mut guard, winner_user, CompletionReason::Declared).await?;

    Ok((&*guard).into())
}

/// List every known battle for the feed.
pub async fn list_battles(state: &SharedState) -> Vec<BattleListItem> {
    let mut items = Vec::new();
    for battle_id in state.battle_ids() {
        if let Ok(room) = state.room(battle_id) {
            let guard = room.lock().await;
            items.push((&*guard).into());
        }
    }
    items
}

/// Full projection of one battle.
pub async fn get_battle(
    state: &SharedState,
    battle_id: Uuid,
) -> Result<BattleSummary, ServiceError> {
    let room = state.room(battle_id)?;
    let guard = room.lock().await;
    Ok((&*guard).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::{join_request, started_battle, test_battle_request, test_state};

    #[tokio::test]
    async fn start_assigns_the_first_turn_to_the_earliest_joiner() {
        let state = test_state();
        let (battle_id, _, users) = started_battle(&state, 3).await;

        let summary = get_battle(&state, battle_id).await.unwrap();
        assert_eq!(summary.status, VisibleBattleStatus::Active);
        assert_eq!(summary.sequence, 1);
        assert_eq!(summary.turn.unwrap().user_id, users[0]);
    }

    #[tokio::test]
    async fn joining_twice_is_refused() {
        let state = test_state();
        let organizer = Uuid::new_v4();
        let summary = create_battle(&state, organizer, test_battle_request())
            .await
            .unwrap();

        let user = Uuid::new_v4();
        join_battle(&state, summary.id, user, join_request("rider")).await.unwrap();
        let err = join_battle(&state, summary.id, user, join_request("rider-again"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::AlreadyJoined)
        ));
    }

    #[tokio::test]
    async fn starting_without_enough_riders_is_refused() {
        let state = test_state();
        let organizer = Uuid::new_v4();
        let summary = create_battle(&state, organizer, test_battle_request())
            .await
            .unwrap();
        join_battle(&state, summary.id, Uuid::new_v4(), join_request("solo"))
            .await
            .unwrap();

        let err = start_battle(&state, summary.id, organizer).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::InsufficientParticipants)
        ));
    }

    #[tokio::test]
    async fn only_the_organizer_starts_and_cancels() {
        let state = test_state();
        let organizer = Uuid::new_v4();
        let summary = create_battle(&state, organizer, test_battle_request())
            .await
            .unwrap();
        for index in 0..2 {
            join_battle(
                &state,
                summary.id,
                Uuid::new_v4(),
                join_request(&format!("rider-{index}")),
            )
            .await
            .unwrap();
        }

        let outsider = Uuid::new_v4();
        assert!(matches!(
            start_battle(&state, summary.id, outsider).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));

        start_battle(&state, summary.id, organizer).await.unwrap();
        assert!(matches!(
            cancel_battle(&state, summary.id, outsider).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn cancellation_blocks_later_joins_and_clears_the_turn() {
        let state = test_state();
        let (battle_id, organizer, _) = started_battle(&state, 2).await;

        let summary = cancel_battle(&state, battle_id, organizer).await.unwrap();
        assert_eq!(summary.status, VisibleBattleStatus::Cancelled);
        assert!(summary.turn.is_none());

        let err = join_battle(&state, battle_id, Uuid::new_v4(), join_request("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn a_judge_can_declare_the_winner() {
        let state = test_state();
        let (battle_id, organizer, users) = started_battle(&state, 3).await;

        let summary = declare_winner(
            &state,
            battle_id,
            organizer,
            DeclareWinnerRequest {
                winner_user_id: users[2],
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.status, VisibleBattleStatus::Completed);
        assert_eq!(summary.winner_user_id, Some(users[2]));

        // Declaring again hits the terminal phase guard.
        let err = declare_winner(
            &state,
            battle_id,
            organizer,
            DeclareWinnerRequest {
                winner_user_id: users[1],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Battle(BattleError::BattleNotActive)
        ));
    }
}
