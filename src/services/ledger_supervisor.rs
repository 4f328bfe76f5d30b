//! Retry supervisor for point credits that failed at the ledger. A committed
//! state transition is never rolled back by a failed credit; the credit is
//! parked here and redelivered with backoff until the ledger accepts it.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{dao::ledger::PendingCredit, services::sse_events, state::SharedState};

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Drain the pending-credit queue forever, backing off while the ledger keeps
/// refusing.
pub async fn run(state: SharedState) {
    let mut delay = POLL_INTERVAL;

    loop {
        sleep(delay).await;

        let all_delivered = retry_pass(&state).await;
        delay = if all_delivered {
            POLL_INTERVAL
        } else {
            (delay * 2).min(MAX_DELAY)
        };
    }
}

/// Attempt to deliver every queued credit once. Returns whether the queue is
/// empty afterwards.
pub(crate) async fn retry_pass(state: &SharedState) -> bool {
    let pending = state.take_pending_credits().await;
    if pending.is_empty() {
        return true;
    }

    let mut clean = true;
    for credit in pending {
        match state
            .ledger()
            .credit(credit.user_id, credit.amount, credit.reason)
            .await
        {
            Ok(()) => {
                info!(
                    user_id = %credit.user_id,
                    amount = credit.amount,
                    reason = %credit.reason,
                    attempts = credit.attempts,
                    "queued credit delivered"
                );
                sse_events::broadcast_points_credited(
                    state,
                    credit.user_id,
                    credit.amount,
                    credit.reason,
                );
            }
            Err(err) => {
                warn!(
                    user_id = %credit.user_id,
                    amount = credit.amount,
                    attempts = credit.attempts,
                    error = %err,
                    "credit retry failed; keeping it queued"
                );
                state
                    .requeue_credit(PendingCredit {
                        attempts: credit.attempts + 1,
                        ..credit
                    })
                    .await;
                clean = false;
            }
        }
    }

    clean
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            ledger::{CreditReason, PointLedger},
            memory::{InMemoryJudgeRoster, InMemoryLedger, LogNotifier},
        },
        state::AppState,
    };

    #[tokio::test]
    async fn refused_credits_are_queued_and_delivered_later() {
        let ledger = Arc::new(InMemoryLedger::new());
        let state = AppState::new(
            AppConfig::default(),
            ledger.clone(),
            Arc::new(LogNotifier::new()),
            Arc::new(InMemoryJudgeRoster::new()),
        );
        let user = Uuid::new_v4();

        ledger.set_refusing(true);
        state
            .credit_points(user, 500, CreditReason::BattlePrize)
            .await;
        assert_eq!(ledger.balance(user).await.unwrap(), 0);

        // Still refusing: the pass fails and keeps the credit queued.
        assert!(!retry_pass(&state).await);

        ledger.set_refusing(false);
        assert!(retry_pass(&state).await);
        assert_eq!(ledger.balance(user).await.unwrap(), 500);

        // Nothing left to deliver.
        assert!(retry_pass(&state).await);
        assert_eq!(ledger.balance(user).await.unwrap(), 500);
    }
}
