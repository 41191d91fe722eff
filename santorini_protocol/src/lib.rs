// santorini_protocol — contract between Santorini clients and move ledgers.
//
// This crate defines the records, events, and the `MoveLedger` trait that a
// client's synchronization controller (`santorini_sync`) talks to. It is
// shared by clients and ledger backends and has no dependency on the rules
// crate.
//
// Module overview:
// - `types.rs`:    ID types: `MatchId`, `MoveIndex`, `Role`.
// - `message.rs`:  `LedgerEntry`, `AppendRequest`, `AppendOutcome`,
//                  `ClockState`, `LedgerEvent`, `MatchStatus`.
// - `ledger.rs`:   `MoveLedger` trait, `Subscription` push inbox, `LedgerError`.
//
// Design decisions:
// - **JSON serialization.** Entries and events derive serde with camelCase
//   field names so a remote backend can store them verbatim.
// - **Actions as plain integers, snapshots as opaque JSON.** The ledger
//   never interprets moves.
// - **No async runtime.** Pushes are delivered over `std::sync::mpsc` and
//   drained by polling.

pub mod ledger;
pub mod message;
pub mod types;

pub use ledger::{LedgerError, MoveLedger, Subscription};
pub use message::{
    AppendOutcome, AppendRequest, ClockState, FinishReason, LedgerEntry, LedgerEvent, MatchStatus,
};
pub use types::{MatchId, MoveIndex, Role};
