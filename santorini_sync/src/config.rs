// Synchronization configuration.
//
// All tunable timing and policy values of the controller live in
// `SyncConfig`, loadable from JSON. The controller never hard-codes these.
// Missing fields take their defaults; unknown fields are rejected so typos
// surface at load time instead of silently falling back.
//
// See also: `controller.rs`, which owns a `SyncConfig`, and `clock.rs` for
// the tick interval.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Each side's starting clock, used until the ledger reports one.
    pub initial_clock_ms: u64,
    /// The local clock only moves in whole ticks of this size.
    pub clock_tick_ms: u64,
    /// Embed a snapshot in every entry whose `move_index + 1` is a multiple
    /// of this. `None` never embeds.
    pub snapshot_every: Option<u64>,
    /// An acknowledged append with no echo after this much local time
    /// forces a resync.
    pub echo_timeout_ms: u64,
    /// While waiting on a remote move, resync if no push has arrived for
    /// this long. Recovers from a lost notification of the opponent's move.
    pub idle_resync_ms: u64,
    /// Consecutive failed resyncs before `pump` reports `ResyncFailed`.
    pub max_resync_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_clock_ms: 300_000,
            clock_tick_ms: 100,
            snapshot_every: Some(20),
            echo_timeout_ms: 5_000,
            idle_resync_ms: 15_000,
            max_resync_attempts: 3,
        }
    }
}

impl SyncConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether the entry at `move_index` should carry a snapshot.
    pub fn embeds_snapshot_at(&self, move_index: u64) -> bool {
        match self.snapshot_every {
            Some(n) if n > 0 => (move_index + 1) % n == 0,
            _ => false,
        }
    }
}
