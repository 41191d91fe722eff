// Core types shared across the engine.
//
// Defines board coordinates (`Coord`), the two seats (`Player`), worker ids,
// the 3×3 neighborhood `Direction` used by the move codec, and the board
// constants every other module reads. All types derive `Serialize` and
// `Deserialize` so they can travel inside snapshots and test fixtures.
//
// Worker ids follow the board encoding of the snapshot format: 0 is an empty
// cell, 1 and 2 are player 0's workers, -1 and -2 are player 1's workers.
// Worker *indices* (0 or 1) are the per-player position of a worker and are
// what the move codec encodes.
//
// See also: `board.rs` for the grid that stores these, `codec.rs` for the
// integer action encoding built on `Direction`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of the square board.
pub const BOARD_SIZE: usize = 5;

/// Number of cells on the board.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Workers owned by each player.
pub const WORKERS_PER_PLAYER: usize = 2;

/// Workers on a fully placed board.
pub const TOTAL_WORKERS: usize = 2 * WORKERS_PER_PLAYER;

/// Moving a worker onto this level wins the game.
pub const WINNING_LEVEL: u8 = 3;

/// A cell at this level is domed: permanently frozen.
pub const DOME_LEVEL: u8 = 4;

/// Signed worker id as stored on the board (0 = no worker).
pub type WorkerId = i8;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A cell position, `y` is the row and `x` the column, both in `0..5` when
/// in bounds. Signed so neighbor arithmetic can step off the board and be
/// rejected by `in_bounds()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub y: i8,
    pub x: i8,
}

impl Coord {
    pub const fn new(y: i8, x: i8) -> Self {
        Self { y, x }
    }

    /// Row-major cell index → coordinate. `None` for indices past the board.
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CELL_COUNT {
            return None;
        }
        Some(Self::new(
            (index / BOARD_SIZE) as i8,
            (index % BOARD_SIZE) as i8,
        ))
    }

    /// Row-major index of an in-bounds coordinate.
    pub fn index(self) -> usize {
        debug_assert!(self.in_bounds(), "index() on off-board coord {self}");
        self.y as usize * BOARD_SIZE + self.x as usize
    }

    pub const fn in_bounds(self) -> bool {
        self.y >= 0 && self.x >= 0 && (self.y as usize) < BOARD_SIZE && (self.x as usize) < BOARD_SIZE
    }

    /// The neighbor in `dir`, or `None` if it falls off the board. The
    /// center direction returns the coordinate itself.
    pub fn step(self, dir: Direction) -> Option<Self> {
        let (dy, dx) = dir.delta();
        let next = Self::new(self.y + dy, self.x + dx);
        next.in_bounds().then_some(next)
    }

    /// True if `other` is one of the 8 surrounding cells.
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && (self.y - other.y).abs() <= 1 && (self.x - other.x).abs() <= 1
    }

    /// Every board coordinate in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..CELL_COUNT).filter_map(Coord::from_index)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.y, self.x)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// One of the two seats. Player 0 always moves first in the play phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    Zero,
    One,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::Zero, Player::One];

    pub const fn index(self) -> usize {
        match self {
            Player::Zero => 0,
            Player::One => 1,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Player::Zero),
            1 => Some(Player::One),
            _ => None,
        }
    }

    pub const fn opponent(self) -> Self {
        match self {
            Player::Zero => Player::One,
            Player::One => Player::Zero,
        }
    }

    /// Board id of this player's worker at `worker_index` (0 or 1).
    pub const fn worker_id(self, worker_index: u8) -> WorkerId {
        let magnitude = worker_index as i8 + 1;
        match self {
            Player::Zero => magnitude,
            Player::One => -magnitude,
        }
    }

    pub const fn owns(self, id: WorkerId) -> bool {
        match self {
            Player::Zero => id > 0,
            Player::One => id < 0,
        }
    }

    /// Owner of a board worker id, `None` for empty cells.
    pub const fn owner_of(id: WorkerId) -> Option<Self> {
        if id > 0 {
            Some(Player::Zero)
        } else if id < 0 {
            Some(Player::One)
        } else {
            None
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.index())
    }
}

/// Per-player worker index (0 or 1) of a board worker id.
pub const fn worker_index(id: WorkerId) -> Option<u8> {
    match id {
        1 | -1 => Some(0),
        2 | -2 => Some(1),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// One of the 9 cells of a 3×3 neighborhood, numbered row-major from the
/// top-left. `d` maps to `(dy, dx) = (d / 3 - 1, d % 3 - 1)`; the center
/// (`d = 4`) is the no-op direction, used as "no build".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Direction(u8);

impl Direction {
    pub const COUNT: u8 = 9;
    pub const CENTER: Direction = Direction(4);
    pub const UP: Direction = Direction(1);
    pub const DOWN: Direction = Direction(7);

    pub const fn new(value: u8) -> Option<Self> {
        if value < Self::COUNT {
            Some(Direction(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn delta(self) -> (i8, i8) {
        ((self.0 / 3) as i8 - 1, (self.0 % 3) as i8 - 1)
    }

    pub const fn is_center(self) -> bool {
        self.0 == Self::CENTER.0
    }

    /// Direction for a displacement of at most one cell on each axis.
    pub fn from_delta(dy: i8, dx: i8) -> Option<Self> {
        if !(-1..=1).contains(&dy) || !(-1..=1).contains(&dx) {
            return None;
        }
        Self::new(((dy + 1) * 3 + (dx + 1)) as u8)
    }

    /// Direction leading from `from` to `to`; `None` if they are more than
    /// one cell apart. Equal cells give the center.
    pub fn between(from: Coord, to: Coord) -> Option<Self> {
        Self::from_delta(to.y - from.y, to.x - from.x)
    }

    /// The 8 non-center directions, in encoding order.
    pub fn neighbors() -> impl Iterator<Item = Direction> {
        (0..Self::COUNT)
            .map(Direction)
            .filter(|d| !d.is_center())
    }

    /// Arrow glyph for move descriptions; the center reads as `Ø`.
    pub const fn arrow(self) -> char {
        const ARROWS: [char; 9] = ['↖', '↑', '↗', '←', 'Ø', '→', '↙', '↓', '↘'];
        ARROWS[self.0 as usize]
    }
}
