//! In-memory implementations of the external ports, used by the binary when
//! no real backends are wired in and by the service-level tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::dao::{
    ledger::{CreditReason, LedgerError, LedgerResult, PointLedger},
    notifier::{NotificationKind, Notifier, NotifyError},
    roster::JudgeRoster,
};

/// Ledger keeping balances in a concurrent map.
#[derive(Default)]
pub struct InMemoryLedger {
    balances: DashMap<Uuid, i64>,
    refuse: AtomicBool,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent credits fail until cleared. Exercises the retry path.
    pub fn set_refusing(&self, refusing: bool) {
        self.refuse.store(refusing, Ordering::SeqCst);
    }
}

impl PointLedger for InMemoryLedger {
    fn credit(
        &self,
        user_id: Uuid,
        amount: u32,
        reason: CreditReason,
    ) -> BoxFuture<'static, LedgerResult<()>> {
        if self.refuse.load(Ordering::SeqCst) {
            return Box::pin(async move {
                Err(LedgerError::unavailable(
                    format!("credit of {amount} for {reason} refused"),
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "ledger offline"),
                ))
            });
        }

        *self.balances.entry(user_id).or_insert(0) += i64::from(amount);
        Box::pin(async { Ok(()) })
    }

    fn balance(&self, user_id: Uuid) -> BoxFuture<'static, LedgerResult<i64>> {
        let balance = self.balances.get(&user_id).map(|entry| *entry).unwrap_or(0);
        Box::pin(async move { Ok(balance) })
    }
}

/// Roster keeping judge sets in a concurrent map.
#[derive(Default)]
pub struct InMemoryJudgeRoster {
    judges: DashMap<Uuid, HashSet<Uuid>>,
}

impl InMemoryJudgeRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }
}

impl JudgeRoster for InMemoryJudgeRoster {
    fn register(&self, battle_id: Uuid, judges: Vec<Uuid>) -> BoxFuture<'static, ()> {
        self.judges
            .entry(battle_id)
            .or_default()
            .extend(judges.into_iter());
        Box::pin(async {})
    }

    fn is_judge(&self, battle_id: Uuid, user_id: Uuid) -> BoxFuture<'static, bool> {
        let member = self
            .judges
            .get(&battle_id)
            .map(|set| set.contains(&user_id))
            .unwrap_or(false);
        Box::pin(async move { member })
    }
}

/// Notifier that only logs; delivery belongs to the Telegram gateway.
#[derive(Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create the logging notifier.
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: Value,
    ) -> BoxFuture<'static, Result<(), NotifyError>> {
        info!(%user_id, ?kind, %payload, "notification dispatched");
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ledger_accumulates_credits() {
        let ledger = InMemoryLedger::new();
        let user = Uuid::new_v4();

        ledger
            .credit(user, 100, CreditReason::BattlePrize)
            .await
            .unwrap();
        ledger
            .credit(user, 50, CreditReason::AchievementReward)
            .await
            .unwrap();

        assert_eq!(ledger.balance(user).await.unwrap(), 150);
    }

    #[tokio::test]
    async fn refusing_ledger_fails_credits() {
        let ledger = InMemoryLedger::new();
        ledger.set_refusing(true);

        let err = ledger
            .credit(Uuid::new_v4(), 10, CreditReason::VideoLiked)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ledger unavailable"));
    }

    #[tokio::test]
    async fn roster_membership_is_per_battle() {
        let roster = InMemoryJudgeRoster::new();
        let battle = Uuid::new_v4();
        let judge = Uuid::new_v4();

        roster.register(battle, vec![judge]).await;

        assert!(roster.is_judge(battle, judge).await);
        assert!(!roster.is_judge(battle, Uuid::new_v4()).await);
        assert!(!roster.is_judge(Uuid::new_v4(), judge).await);
    }
}
