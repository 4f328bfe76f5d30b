use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::BattlePhase;

/// Publicly visible battle status exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleBattleStatus {
    /// Riders can still join.
    Registration,
    /// Turns are rotating.
    Active,
    /// A winner has been recorded.
    Completed,
    /// The organizer cancelled the battle.
    Cancelled,
}

impl From<BattlePhase> for VisibleBattleStatus {
    fn from(value: BattlePhase) -> Self {
        match value {
            BattlePhase::Registration => VisibleBattleStatus::Registration,
            BattlePhase::Active => VisibleBattleStatus::Active,
            BattlePhase::Completed => VisibleBattleStatus::Completed,
            BattlePhase::Cancelled => VisibleBattleStatus::Cancelled,
        }
    }
}
