// Test-only clients for multi-participant ledger integration tests.
//
// Wraps a real `MatchController` (from `santorini_sync`) around a shared
// in-process `MemoryLedger` (from `santorini_ledger`) so several peers can
// play one match in a single test. Everything goes through the same code
// paths a real client uses; the only test-specific code here is the
// panicking convenience wrappers and the `settle` loop.
//
// See also: `tests/convergence.rs` for the scenarios.

use std::sync::Arc;

use santorini_ledger::MemoryLedger;
use santorini_protocol::{MatchId, MoveLedger};
use santorini_sim::rules;
use santorini_sim::types::Player;
use santorini_sim::{Action, Snapshot};
use santorini_sync::{MatchController, Notice, SyncConfig, SyncError};

/// Placements that put worker 1 on (2,2), worker 2 on (0,1), and player 1's
/// workers on (4,4) and (4,3). Play starts right after.
pub const OPENING: [u16; 4] = [12, 1, 24, 23];

/// Upper bound on pump rounds in `settle` before giving up.
const SETTLE_ROUNDS: usize = 8;

/// A fresh ledger holding one empty match.
pub fn new_match() -> (Arc<MemoryLedger>, MatchId) {
    let ledger = Arc::new(MemoryLedger::new());
    let id = ledger.create_match();
    (ledger, id)
}

/// Fold `actions` over the initial snapshot, panicking on an illegal one.
pub fn replay(actions: &[u16]) -> Snapshot {
    actions.iter().fold(Snapshot::initial(), |state, &a| {
        rules::apply_action(&state, Action(a))
            .unwrap_or_else(|err| panic!("replaying {a}: {err}"))
    })
}

/// Replay everything the ledger currently stores for `match_id`.
pub fn ledger_state(ledger: &MemoryLedger, match_id: &MatchId) -> Snapshot {
    let actions: Vec<u16> = ledger
        .list(match_id)
        .expect("listing ledger")
        .iter()
        .map(|entry| u16::try_from(entry.action).expect("action id fits u16"))
        .collect();
    replay(&actions)
}

/// One participant: a controller for some seats of a shared match.
pub struct TestPeer {
    pub name: &'static str,
    pub controller: MatchController<Arc<MemoryLedger>>,
}

impl TestPeer {
    pub fn join(
        name: &'static str,
        ledger: &Arc<MemoryLedger>,
        match_id: &MatchId,
        seats: &[Player],
    ) -> Self {
        Self::join_with(name, ledger, match_id, seats, SyncConfig::default())
    }

    pub fn join_with(
        name: &'static str,
        ledger: &Arc<MemoryLedger>,
        match_id: &MatchId,
        seats: &[Player],
        config: SyncConfig,
    ) -> Self {
        let controller =
            MatchController::attach(Arc::clone(ledger), match_id.clone(), seats, config)
                .unwrap_or_else(|err| panic!("{name} failed to attach: {err}"));
        Self { name, controller }
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.controller.snapshot()
    }

    /// Submit `action` and pump once so the echo is processed.
    pub fn play(&mut self, action: u16) {
        self.try_play(action)
            .unwrap_or_else(|err| panic!("{} could not play {action}: {err}", self.name));
        self.pump();
    }

    pub fn try_play(&mut self, action: u16) -> Result<(), SyncError> {
        self.controller.submit_action(Action(action))
    }

    pub fn pump(&mut self) {
        self.controller
            .pump()
            .unwrap_or_else(|err| panic!("{} pump failed: {err}", self.name));
    }

    pub fn notices(&mut self) -> Vec<Notice> {
        self.controller.drain_notices()
    }
}

/// Pump every peer until none has a pending move or an unfinished resync.
/// Panics if that does not happen within a few rounds.
pub fn settle(peers: &mut [&mut TestPeer]) {
    for _ in 0..SETTLE_ROUNDS {
        for peer in peers.iter_mut() {
            peer.pump();
        }
        let quiet = peers
            .iter()
            .all(|p| p.controller.pending().is_none() && !p.controller.is_syncing());
        if quiet {
            return;
        }
    }
    panic!("peers did not settle in {SETTLE_ROUNDS} rounds");
}
