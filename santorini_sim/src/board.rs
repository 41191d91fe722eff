// Dense 5×5 board grid.
//
// Stores one `Cell` per board position: the id of the worker standing on it
// (0 for none) and the building level (0..=4, 4 being a dome). The grid is a
// fixed-size array indexed `[y][x]`, so copying a board is a plain memcpy and
// snapshots can own their board by value.
//
// `Board` only enforces bounds; the game invariants (one of each worker id,
// levels never decrease, domes stay empty) are upheld by `rules.rs` for
// every transition and checked by `snapshot.rs` when importing.
//
// See also: `types.rs` for `Coord` and worker ids, `rules.rs` for the
// transitions that mutate a board copy.

use crate::types::{BOARD_SIZE, Coord, DOME_LEVEL, Player, WorkerId};
use serde::{Deserialize, Serialize};

/// One board position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub worker: WorkerId,
    pub level: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        worker: 0,
        level: 0,
    };

    pub const fn is_domed(self) -> bool {
        self.level >= DOME_LEVEL
    }

    pub const fn is_occupied(self) -> bool {
        self.worker != 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty level-0 board with no workers.
    pub const fn new() -> Self {
        Self {
            cells: [[Cell::EMPTY; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Cell at `coord`, or `None` if off the board.
    pub fn get(&self, coord: Coord) -> Option<Cell> {
        coord
            .in_bounds()
            .then(|| self.cells[coord.y as usize][coord.x as usize])
    }

    /// Overwrite the cell at `coord`. Returns `false` (no change) if off the board.
    pub fn set(&mut self, coord: Coord, cell: Cell) -> bool {
        if !coord.in_bounds() {
            return false;
        }
        self.cells[coord.y as usize][coord.x as usize] = cell;
        true
    }

    pub fn level(&self, coord: Coord) -> Option<u8> {
        self.get(coord).map(|c| c.level)
    }

    pub fn worker(&self, coord: Coord) -> Option<WorkerId> {
        self.get(coord).map(|c| c.worker)
    }

    /// True if `coord` is on the board, not domed, and has no worker.
    pub fn is_free(&self, coord: Coord) -> bool {
        self.get(coord)
            .is_some_and(|c| !c.is_domed() && !c.is_occupied())
    }

    /// Position of the worker with board id `id`, if placed.
    pub fn find_worker(&self, id: WorkerId) -> Option<Coord> {
        if id == 0 {
            return None;
        }
        self.iter().find(|(_, c)| c.worker == id).map(|(pos, _)| pos)
    }

    /// Positions of `player`'s placed workers, indexed by worker index.
    pub fn workers_of(&self, player: Player) -> [Option<Coord>; 2] {
        [
            self.find_worker(player.worker_id(0)),
            self.find_worker(player.worker_id(1)),
        ]
    }

    /// Number of workers currently on the board.
    pub fn workers_placed(&self) -> usize {
        self.iter().filter(|(_, c)| c.is_occupied()).count()
    }

    /// All cells in row-major order with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        Coord::all().map(move |pos| (pos, self.cells[pos.y as usize][pos.x as usize]))
    }

    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }
}
