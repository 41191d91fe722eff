// santorini_sync — keeps a local Santorini mirror convergent with a ledger.
//
// A client plays against an optimistic local copy of the match (the
// mirror) while the authoritative record is an append-only move ledger
// shared with the other participants. This crate owns the bookkeeping in
// between: optimistic submission, push handling, conflict recovery, full
// resync, snapshot embedding, and the local display clock.
//
// Module overview:
// - `controller.rs`: MatchController: attach, gestures, pump, resync, detach.
// - `clock.rs`:      LocalClock: per-side remaining time between entries.
// - `oracle.rs`:     MoveOracle trait, FirstLegalOracle, OracleTicket.
// - `config.rs`:     SyncConfig: clock, snapshot, and timeout tuning.
// - `notice.rs`:     Notice: background events queued for the UI.
// - `error.rs`:      SyncError: per-call failures.
//
// See also: `santorini_sim` for the rules, `santorini_protocol` for the
// ledger contract, `santorini_ledger` for the in-memory backend used in
// tests and single-process play.
//
// **Critical constraint: determinism.** The mirror is always rebuilt by
// replaying ledger actions through `santorini_sim`, never patched by hand.
// The controller reads no wall clock; time only enters through
// `advance_clock(elapsed_ms)`.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod notice;
pub mod oracle;

pub use clock::LocalClock;
pub use config::SyncConfig;
pub use controller::{MatchController, PendingMove, player_of, role_of};
pub use error::SyncError;
pub use notice::Notice;
pub use oracle::{FirstLegalOracle, MoveOracle, OracleTicket};
