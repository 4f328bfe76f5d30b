//! Terminal-condition handling: detects the sole survivor, freezes the
//! battle, and pays out. Infrastructure side effects run only after the
//! lifecycle transition has committed, so a failed credit can never un-declare
//! a winner.

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{ledger::CreditReason, notifier::NotificationKind},
    dto::phase::VisibleBattleStatus,
    error::ServiceError,
    services::{achievement_service, sse_events},
    state::{
        BattleRoom, CompletionReason, SharedState,
        achievements::{AchievementCategory, ProgressUpdate},
        state_machine::{BattleEvent, BattlePhase},
    },
};

/// Freeze the battle with `winner_user` and run the payout side effects.
///
/// The caller must hold the battle room lock.
pub async fn complete_battle(
    state: &SharedState,
    room: &mut BattleRoom,
    winner_user: Uuid,
    reason: CompletionReason,
) -> Result<(), ServiceError> {
    room.run_transition(BattleEvent::Complete(reason), |battle| {
        battle.winner_user_id = Some(winner_user);
        battle.clear_turn();
        Ok(())
    })?;

    let battle_id = room.battle.id;
    let prize = room.battle.prize_points;
    info!(%battle_id, %winner_user, prize, ?reason, "battle completed");

    sse_events::broadcast_status_changed(
        state,
        battle_id,
        VisibleBattleStatus::Completed,
        Some(winner_user),
    );
    sse_events::broadcast_battle_completed(state, battle_id, winner_user, prize);

    state
        .credit_points(winner_user, prize, CreditReason::BattlePrize)
        .await;
    achievement_service::update_progress(
        state,
        winner_user,
        AchievementCategory::Wins,
        ProgressUpdate::Increment(1),
    )
    .await;
    state.notify_user(
        winner_user,
        NotificationKind::BattleWon,
        json!({ "battle_id": battle_id, "prize_points": prize }),
    );

    Ok(())
}

/// Complete the battle if exactly one active participant remains. Calling it
/// on an already-completed battle is a no-op, not an error. Returns whether
/// the battle is completed afterwards.
pub async fn check_for_winner(
    state: &SharedState,
    room: &mut BattleRoom,
) -> Result<bool, ServiceError> {
    match room.phase() {
        BattlePhase::Completed => return Ok(true),
        BattlePhase::Active => {}
        _ => return Ok(false),
    }

    let Some(winner_user) = room.battle.sole_active().map(|participant| participant.user_id)
    else {
        return Ok(false);
    };

    complete_battle(state, room, winner_user, CompletionReason::SoleSurvivor).await?;
    Ok(true)
}
