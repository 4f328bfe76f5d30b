use std::error::Error;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Error raised by the notification transport.
#[derive(Debug, Error)]
#[error("notification dispatch failed: {message}")]
pub struct NotifyError {
    /// Human-readable context for the failure.
    pub message: String,
    /// Underlying transport error, when one exists.
    #[source]
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl NotifyError {
    /// Construct a dispatch error from a message alone.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

/// Template selector for outbound user notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// It is now this user's turn in a battle.
    TurnStarted,
    /// A judge resolved the user's submission.
    SubmissionJudged,
    /// The user collected the full elimination word.
    Eliminated,
    /// The user won a battle.
    BattleWon,
    /// The user completed an achievement.
    AchievementEarned,
    /// The user won the daily contest.
    DailyWinner,
}

/// Best-effort push notification port (Telegram delivery lives elsewhere).
///
/// Failures are logged and swallowed by callers; they must never surface as
/// state-machine errors or roll back a committed transition.
pub trait Notifier: Send + Sync {
    /// Dispatch one notification to a user.
    fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: Value,
    ) -> BoxFuture<'static, Result<(), NotifyError>>;
}
