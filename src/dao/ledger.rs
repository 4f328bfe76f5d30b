use std::error::Error;
use std::fmt;

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error raised by the point ledger regardless of the backing implementation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger backend could not be reached or refused the operation.
    #[error("ledger unavailable: {message}")]
    Unavailable {
        /// Human-readable context for the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl LedgerError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        LedgerError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Why points were credited; forwarded to the ledger for bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditReason {
    /// Battle prize paid to the winner.
    BattlePrize,
    /// Reward attached to a completed achievement.
    AchievementReward,
    /// Tariff points for a like received on a video.
    VideoLiked,
    /// Tariff points for a posted comment.
    CommentPosted,
    /// Tariff points for views received on a video.
    VideoViewed,
    /// Tariff points for uploading a video.
    VideoUploaded,
    /// Daily-winner contest payout.
    DailyWinner,
}

impl fmt::Display for CreditReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CreditReason::BattlePrize => "battle_prize",
            CreditReason::AchievementReward => "achievement_reward",
            CreditReason::VideoLiked => "video_liked",
            CreditReason::CommentPosted => "comment_posted",
            CreditReason::VideoViewed => "video_viewed",
            CreditReason::VideoUploaded => "video_uploaded",
            CreditReason::DailyWinner => "daily_winner",
        };
        f.write_str(label)
    }
}

/// A credit that failed at the ledger and waits for the retry supervisor.
#[derive(Debug, Clone)]
pub struct PendingCredit {
    /// User to credit.
    pub user_id: Uuid,
    /// Amount of points.
    pub amount: u32,
    /// Original credit reason.
    pub reason: CreditReason,
    /// Delivery attempts made so far.
    pub attempts: u32,
}

/// Abstraction over the points economy owned by the wider application.
///
/// The core never stores balances itself; it only pushes credits through this
/// port and treats failures as retryable (see [`crate::dao::retry`]).
pub trait PointLedger: Send + Sync {
    /// Credit `amount` points to a user.
    fn credit(
        &self,
        user_id: Uuid,
        amount: u32,
        reason: CreditReason,
    ) -> BoxFuture<'static, LedgerResult<()>>;

    /// Current balance for a user, used by read-only projections.
    fn balance(&self, user_id: Uuid) -> BoxFuture<'static, LedgerResult<i64>>;
}
