// Move-suggestion seam.
//
// An oracle is any external component that picks an action for a position:
// a search engine, a learned policy, a scripted opponent. The controller
// treats it as opaque and routes its answer through the same validation as
// a human gesture, so a bad suggestion is rejected like a bad click.
//
// Synchronous oracles implement `MoveOracle` and are driven by
// `MatchController::play_oracle_turn`. Oracles that answer later (another
// thread, a remote service) use the two-phase form instead:
// `begin_oracle_turn` hands out an `OracleTicket` with the snapshot to
// think about, and `complete_oracle_turn` submits the answer. A ticket
// whose mirror has changed since it was issued (a move applied, a resync)
// is stale and its answer is dropped.

use santorini_sim::{Action, Snapshot};

pub trait MoveOracle {
    /// Pick an action for the side to move, or `None` to pass.
    fn suggest_action(&mut self, state: &Snapshot) -> Option<Action>;
}

impl<F> MoveOracle for F
where
    F: FnMut(&Snapshot) -> Option<Action>,
{
    fn suggest_action(&mut self, state: &Snapshot) -> Option<Action> {
        self(state)
    }
}

/// Always plays the lowest-numbered legal action. Handy as a deterministic
/// opponent in tests and hot-seat games.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstLegalOracle;

impl MoveOracle for FirstLegalOracle {
    fn suggest_action(&mut self, state: &Snapshot) -> Option<Action> {
        santorini_sim::rules::legal_actions(state).first().copied()
    }
}

/// A pending asynchronous oracle request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleTicket {
    pub(crate) generation: u64,
    snapshot: Snapshot,
}

impl OracleTicket {
    pub(crate) fn new(generation: u64, snapshot: Snapshot) -> Self {
        Self {
            generation,
            snapshot,
        }
    }

    /// The position the oracle should answer for.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}
