use futures::future::BoxFuture;
use uuid::Uuid;

/// Judge membership lookup for battles.
///
/// The roster is declared by the organizer at battle creation and owned by the
/// wider application; the core only asks one question of it.
pub trait JudgeRoster: Send + Sync {
    /// Record the judge set for a freshly created battle.
    fn register(&self, battle_id: Uuid, judges: Vec<Uuid>) -> BoxFuture<'static, ()>;

    /// Whether `user_id` may judge submissions in `battle_id`.
    fn is_judge(&self, battle_id: Uuid, user_id: Uuid) -> BoxFuture<'static, bool>;
}
