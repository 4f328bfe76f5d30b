/// Point ledger port credited by wins and achievement rewards.
pub mod ledger;
/// In-memory implementations of the external ports.
pub mod memory;
/// Best-effort notification dispatch port.
pub mod notifier;
/// Judge roster membership port.
pub mod roster;
