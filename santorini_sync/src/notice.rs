// User-facing notices raised by the controller.
//
// Failures that belong to a specific call come back as `SyncError` from
// that call. Everything that happens in the background (a resync, a
// skipped ledger entry, a lost race, a clock running out) is queued as a
// `Notice` for the UI to drain with `MatchController::drain_notices()`.

use santorini_protocol::{MatchStatus, MoveIndex};
use santorini_sim::types::Player;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A ledger call failed; the controller kept its last good mirror and
    /// will retry on the next `pump`.
    Retry { reason: String },
    /// The mirror was rebuilt from the ledger. `length` is the number of
    /// ledger entries it now reflects.
    Resynced { length: u64 },
    /// A ledger entry could not be replayed and was skipped.
    ReplaySkipped { move_index: MoveIndex, reason: String },
    /// Another participant's move took the index of our local move; the
    /// local move was thrown away.
    ConflictDiscarded { move_index: MoveIndex },
    /// A local move could not be carried across a resync and was dropped.
    PendingDropped { move_index: MoveIndex },
    /// `player`'s local clock reached zero. Provisional until the ledger
    /// finishes the match.
    TimeExpired { player: Player },
    /// The ledger reported the match as finished.
    MatchFinished { status: MatchStatus },
}
