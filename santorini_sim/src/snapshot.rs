// Immutable game state and its canonical JSON form.
//
// A `Snapshot` is the complete state of a game between actions: the board,
// the side to move, the winner (if any), and a round counter. Snapshots are
// never mutated after construction. `rules.rs` produces a new one for every
// applied action, and `game.rs` keeps a history of them.
//
// The canonical serialization is
//
//   {"version": 1, "board": [5][5][workerId, level, reserved], "activePlayer": 0|1}
//
// The reserved value is 0 everywhere except cell (0, 0), which carries the
// round counter (capped at 127). Import validates everything a legal game
// could never produce and rejects it with a `SnapshotError`; the winner is
// not stored and is re-derived on import (a worker standing on level 3 has
// won; a play-phase side to move with no legal action has lost). Exporting
// an imported snapshot reproduces the input exactly.
//
// See also: `rules.rs` for the transitions, `error.rs` for `SnapshotError`,
// the sync crate's controller for embedding snapshots in ledger entries.
//
// **Critical constraint: determinism.** Two snapshots built from the same
// action sequence compare equal and export to identical JSON.

use crate::board::{Board, Cell};
use crate::error::SnapshotError;
use crate::rules;
use crate::types::{BOARD_SIZE, Coord, DOME_LEVEL, Player, TOTAL_WORKERS, WINNING_LEVEL, WorkerId};
use serde::{Deserialize, Serialize};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The round counter saturates here (it must fit the reserved byte).
pub const MAX_ROUND: u8 = 127;

/// Order in which workers enter the board during placement.
pub const PLACEMENT_ORDER: [WorkerId; TOTAL_WORKERS] = [1, 2, -1, -2];

/// Coarse game phase, derived from a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// `workers_placed` of the 4 workers are on the board.
    Placement { workers_placed: u8 },
    Play,
    Terminal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot {
    board: Board,
    active_player: Player,
    winner: Option<Player>,
    round: u8,
}

impl Snapshot {
    /// The empty board, player 0 to place.
    pub const fn initial() -> Self {
        Self {
            board: Board::new(),
            active_player: Player::Zero,
            winner: None,
            round: 0,
        }
    }

    pub(crate) const fn from_parts(
        board: Board,
        active_player: Player,
        winner: Option<Player>,
        round: u8,
    ) -> Self {
        Self {
            board,
            active_player,
            winner,
            round,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_player(&self) -> Player {
        self.active_player
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Actions applied since the empty board, saturating at `MAX_ROUND`.
    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn phase(&self) -> Phase {
        if self.winner.is_some() {
            return Phase::Terminal;
        }
        let placed = self.board.workers_placed();
        if placed < TOTAL_WORKERS {
            Phase::Placement {
                workers_placed: placed as u8,
            }
        } else {
            Phase::Play
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.winner.is_some()
    }

    /// Per-player scores: `(1, 0)` or `(0, 1)` once decided, `(0, 0)` before.
    pub fn terminal(&self) -> (u8, u8) {
        match self.winner {
            Some(Player::Zero) => (1, 0),
            Some(Player::One) => (0, 1),
            None => (0, 0),
        }
    }

    /// Highest level under one of `player`'s workers (0 if none placed).
    pub fn height_score(&self, player: Player) -> u8 {
        self.board
            .workers_of(player)
            .into_iter()
            .flatten()
            .filter_map(|pos| self.board.level(pos))
            .max()
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn to_record(&self) -> SnapshotRecord {
        let mut board = [[[0i32; 3]; BOARD_SIZE]; BOARD_SIZE];
        for (pos, cell) in self.board.iter() {
            board[pos.y as usize][pos.x as usize] = [cell.worker as i32, cell.level as i32, 0];
        }
        board[0][0][2] = self.round as i32;
        SnapshotRecord {
            version: SNAPSHOT_VERSION,
            board,
            active_player: self.active_player.index() as u8,
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.to_record())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record())
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let record: SnapshotRecord = serde_json::from_str(json)?;
        Self::from_record(&record)
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self, SnapshotError> {
        let record = SnapshotRecord::deserialize(value)?;
        Self::from_record(&record)
    }

    /// Validate a record and rebuild the snapshot it describes.
    pub fn from_record(record: &SnapshotRecord) -> Result<Self, SnapshotError> {
        if record.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(record.version));
        }

        let mut board = Board::new();
        let mut seen = [false; TOTAL_WORKERS];
        for (y, row) in record.board.iter().enumerate() {
            for (x, &[worker, level, reserved]) in row.iter().enumerate() {
                let cell = Coord::new(y as i8, x as i8);
                if !(-2..=2).contains(&worker) {
                    return Err(SnapshotError::WorkerId {
                        cell,
                        value: worker,
                    });
                }
                if !(0..=DOME_LEVEL as i32).contains(&level) {
                    return Err(SnapshotError::Level { cell, value: level });
                }
                if (y, x) == (0, 0) {
                    if !(0..=MAX_ROUND as i32).contains(&reserved) {
                        return Err(SnapshotError::Round(reserved));
                    }
                } else if reserved != 0 {
                    return Err(SnapshotError::Reserved {
                        cell,
                        value: reserved,
                    });
                }
                let worker = worker as WorkerId;
                if worker != 0 {
                    if level >= DOME_LEVEL as i32 {
                        return Err(SnapshotError::WorkerOnDome(cell));
                    }
                    let slot = placement_slot(worker);
                    if seen[slot] {
                        return Err(SnapshotError::DuplicateWorker(worker));
                    }
                    seen[slot] = true;
                }
                board.set(
                    cell,
                    Cell {
                        worker,
                        level: level as u8,
                    },
                );
            }
        }

        // Present workers must be a prefix of the placement order.
        let placed = seen.iter().take_while(|&&s| s).count();
        if let Some(slot) = seen.iter().skip(placed).position(|&s| s) {
            return Err(SnapshotError::PlacementOrder(PLACEMENT_ORDER[placed + slot]));
        }

        let active_player = Player::from_index(record.active_player as usize)
            .ok_or(SnapshotError::ActivePlayer(record.active_player as i32))?;
        if placed < TOTAL_WORKERS && active_player != placing_player(placed) {
            return Err(SnapshotError::ActivePlayerMismatch);
        }

        let round = record.board[0][0][2] as u8;
        let mut snapshot = Self::from_parts(board, active_player, None, round);
        snapshot.winner = derive_winner(&snapshot)?;
        Ok(snapshot)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// Serialized shape of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotRecord {
    pub version: u32,
    pub board: [[[i32; 3]; BOARD_SIZE]; BOARD_SIZE],
    #[serde(rename = "activePlayer")]
    pub active_player: u8,
}

/// Player placing the next worker when `placed` workers are down.
pub(crate) const fn placing_player(placed: usize) -> Player {
    if placed < 2 { Player::Zero } else { Player::One }
}

/// Index of a worker id in `PLACEMENT_ORDER`. Caller guarantees `id != 0`.
fn placement_slot(id: WorkerId) -> usize {
    match id {
        1 => 0,
        2 => 1,
        -1 => 2,
        _ => 3,
    }
}

fn derive_winner(snapshot: &Snapshot) -> Result<Option<Player>, SnapshotError> {
    let mut climbed = snapshot
        .board
        .iter()
        .filter(|(_, c)| c.is_occupied() && c.level == WINNING_LEVEL)
        .filter_map(|(_, c)| Player::owner_of(c.worker));
    if let Some(first) = climbed.next() {
        if climbed.any(|p| p != first) {
            return Err(SnapshotError::ConflictingWinners);
        }
        return Ok(Some(first));
    }
    if snapshot.phase() == Phase::Play && rules::legal_actions(snapshot).is_empty() {
        return Ok(Some(snapshot.active_player.opponent()));
    }
    Ok(None)
}
