pub mod achievements;
pub mod battle;
mod sse;
pub mod state_machine;

use std::{collections::VecDeque, sync::Arc};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        ledger::{CreditReason, PendingCredit, PointLedger},
        notifier::{NotificationKind, Notifier},
        roster::JudgeRoster,
    },
    error::ServiceError,
    state::{
        achievements::AchievementBoard,
        battle::Battle,
        state_machine::{BattleEvent, BattlePhase, BattleStateMachine},
    },
};

pub use self::sse::SseHub;
pub use self::state_machine::{
    AbortError, ApplyError, CompletionReason, Plan, PlanError, PlanId, Snapshot,
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// One battle plus its lifecycle machine, guarded by a single lock so every
/// check-and-mutate sequence on the battle is serialized. The lock doubles as
/// the per-battle transition gate: a submission and a deadline expiry racing
/// for the same turn resolve in whichever order they acquire it, and the loser
/// re-evaluates against the committed pointer state.
#[derive(Debug)]
pub struct BattleRoom {
    /// Lifecycle machine for this battle.
    pub machine: BattleStateMachine,
    /// Battle data: roster, submissions, turn pointer.
    pub battle: Battle,
}

impl BattleRoom {
    /// Wrap a freshly created battle with a registration-phase machine.
    pub fn new(battle: Battle) -> Self {
        Self {
            machine: BattleStateMachine::new(),
            battle,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> BattlePhase {
        self.machine.phase()
    }

    /// Guard used by operations that only make sense while turns rotate.
    pub fn ensure_active(&self) -> Result<(), ServiceError> {
        if self.phase() == BattlePhase::Active {
            Ok(())
        } else {
            Err(battle::BattleError::BattleNotActive.into())
        }
    }

    /// Execute a lifecycle transition: plan the event, run `work` against the
    /// battle data, then apply the plan. When `work` fails the plan is aborted
    /// and the phase is left untouched.
    pub fn run_transition<T>(
        &mut self,
        event: BattleEvent,
        work: impl FnOnce(&mut Battle) -> Result<T, ServiceError>,
    ) -> Result<(T, BattlePhase), ServiceError> {
        let plan = self.machine.plan(event)?;

        match work(&mut self.battle) {
            Ok(value) => {
                let next = self.machine.apply(plan.id)?;
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.machine.abort(plan.id) {
                    warn!(
                        event = ?event,
                        plan_id = %plan.id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                Err(err)
            }
        }
    }
}

/// Central application state: the battle registry, the achievement board, the
/// outbound event hub, and the external ports.
pub struct AppState {
    config: Arc<AppConfig>,
    battles: DashMap<Uuid, Arc<Mutex<BattleRoom>>>,
    achievements: AchievementBoard,
    sse: SseHub,
    ledger: Arc<dyn PointLedger>,
    notifier: Arc<dyn Notifier>,
    judges: Arc<dyn JudgeRoster>,
    pending_credits: Mutex<VecDeque<PendingCredit>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        ledger: Arc<dyn PointLedger>,
        notifier: Arc<dyn Notifier>,
        judges: Arc<dyn JudgeRoster>,
    ) -> SharedState {
        let achievements = AchievementBoard::new(config.achievements());
        Arc::new(Self {
            config: Arc::new(config),
            battles: DashMap::new(),
            achievements,
            sse: SseHub::new(32),
            ledger,
            notifier,
            judges,
            pending_credits: Mutex::new(VecDeque::new()),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub for the public event stream.
    pub fn events(&self) -> &SseHub {
        &self.sse
    }

    /// Achievement catalog and progress board.
    pub fn achievements(&self) -> &AchievementBoard {
        &self.achievements
    }

    /// Register a new battle room, returning its shared handle.
    pub fn insert_room(&self, room: BattleRoom) -> Arc<Mutex<BattleRoom>> {
        let id = room.battle.id;
        let handle = Arc::new(Mutex::new(room));
        self.battles.insert(id, handle.clone());
        handle
    }

    /// Look up a battle room by id.
    pub fn room(&self, battle_id: Uuid) -> Result<Arc<Mutex<BattleRoom>>, ServiceError> {
        self.battles
            .get(&battle_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("battle `{battle_id}` not found")))
    }

    /// Identifiers of every known battle, for the sweeper and list views.
    pub fn battle_ids(&self) -> Vec<Uuid> {
        self.battles.iter().map(|entry| *entry.key()).collect()
    }

    /// Whether `user_id` may judge submissions in `battle_id`.
    pub async fn is_judge(&self, battle_id: Uuid, user_id: Uuid) -> bool {
        self.judges.is_judge(battle_id, user_id).await
    }

    /// Record the judge set for a freshly created battle.
    pub async fn register_judges(&self, battle_id: Uuid, judges: Vec<Uuid>) {
        self.judges.register(battle_id, judges).await;
    }

    /// Credit points through the ledger port. A failed credit is logged and
    /// parked for the retry supervisor; it never propagates to the caller, so
    /// a committed state transition cannot be rolled back by the ledger.
    pub async fn credit_points(&self, user_id: Uuid, amount: u32, reason: CreditReason) {
        if amount == 0 {
            return;
        }

        match self.ledger.credit(user_id, amount, reason).await {
            Ok(()) => {
                crate::services::sse_events::broadcast_points_credited(
                    self, user_id, amount, reason,
                );
            }
            Err(err) => {
                warn!(%user_id, amount, %reason, error = %err, "ledger credit failed; queueing for retry");
                self.pending_credits.lock().await.push_back(PendingCredit {
                    user_id,
                    amount,
                    reason,
                    attempts: 1,
                });
            }
        }
    }

    /// Dispatch a notification without waiting for the transport. Failures
    /// are logged and swallowed.
    pub fn notify_user(&self, user_id: Uuid, kind: NotificationKind, payload: serde_json::Value) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(user_id, kind, payload).await {
                warn!(%user_id, ?kind, error = %err, "notification dispatch failed");
            }
        });
    }

    /// Drain the queue of credits awaiting retry.
    pub async fn take_pending_credits(&self) -> Vec<PendingCredit> {
        self.pending_credits.lock().await.drain(..).collect()
    }

    /// Put a still-failing credit back for the next retry pass.
    pub async fn requeue_credit(&self, credit: PendingCredit) {
        self.pending_credits.lock().await.push_back(credit);
    }

    /// Direct handle to the ledger port, used by the retry supervisor.
    pub fn ledger(&self) -> &Arc<dyn PointLedger> {
        &self.ledger
    }
}
