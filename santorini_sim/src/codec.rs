// Integer action encoding.
//
// Every action either player can take is a single integer in `[0, 187)`:
//
//   [0, 25)    placement: put the next worker on cell `(a / 5, a % 5)`.
//   [25, 187)  move + build: `m = a - 25`, worker index `m / 81`, move
//              direction `(m % 81) / 9`, build direction `m % 9`.
//
// Directions are the 9-cell neighborhood of `Direction` (center = 4). The
// build direction is relative to the worker's *destination*. A center build
// direction means "no build", which only the winning climb to level 3 uses.
// A center move direction decodes fine but is never legal.
//
// The codec is purely arithmetic: it knows nothing about board state.
// Legality lives in `rules.rs`.
//
// See also: `types.rs` for `Direction`, `rules.rs` for legal action
// enumeration, `selector.rs` for building actions from cell clicks.

use crate::error::CodecError;
use crate::types::{Coord, Direction, Player, WORKERS_PER_PLAYER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placement actions occupy `[0, PLACEMENT_ACTIONS)`.
pub const PLACEMENT_ACTIONS: u16 = 25;

/// Move actions per worker (9 move directions × 9 build directions).
pub const MOVES_PER_WORKER: u16 = 81;

/// Move actions occupy `[PLACEMENT_ACTIONS, ACTION_COUNT)`.
pub const MOVE_ACTIONS: u16 = MOVES_PER_WORKER * WORKERS_PER_PLAYER as u16;

/// Size of the action space.
pub const ACTION_COUNT: u16 = PLACEMENT_ACTIONS + MOVE_ACTIONS;

/// An encoded action id. Serializes as a bare integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(pub u16);

impl Action {
    pub const fn is_placement(self) -> bool {
        self.0 < PLACEMENT_ACTIONS
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structured form of an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionDescriptor {
    Place {
        cell: Coord,
    },
    Move {
        worker: u8,
        move_dir: Direction,
        build_dir: Direction,
    },
}

pub fn decode(action: Action) -> Result<ActionDescriptor, CodecError> {
    let a = action.0;
    if a < PLACEMENT_ACTIONS {
        return Ok(ActionDescriptor::Place {
            cell: Coord::new((a / 5) as i8, (a % 5) as i8),
        });
    }
    if a >= ACTION_COUNT {
        return Err(CodecError::ActionOutOfRange(a));
    }
    let m = a - PLACEMENT_ACTIONS;
    let move_dir = Direction::new(((m % MOVES_PER_WORKER) / 9) as u8)
        .ok_or(CodecError::DirectionOutOfRange(((m % MOVES_PER_WORKER) / 9) as u8))?;
    let build_dir =
        Direction::new((m % 9) as u8).ok_or(CodecError::DirectionOutOfRange((m % 9) as u8))?;
    Ok(ActionDescriptor::Move {
        worker: (m / MOVES_PER_WORKER) as u8,
        move_dir,
        build_dir,
    })
}

pub fn encode(descriptor: ActionDescriptor) -> Result<Action, CodecError> {
    match descriptor {
        ActionDescriptor::Place { cell } => {
            if !cell.in_bounds() {
                return Err(CodecError::CellOffBoard(cell));
            }
            Ok(Action(cell.index() as u16))
        }
        ActionDescriptor::Move {
            worker,
            move_dir,
            build_dir,
        } => {
            if worker as usize >= WORKERS_PER_PLAYER {
                return Err(CodecError::WorkerOutOfRange(worker));
            }
            Ok(Action(
                PLACEMENT_ACTIONS
                    + worker as u16 * MOVES_PER_WORKER
                    + move_dir.value() as u16 * 9
                    + build_dir.value() as u16,
            ))
        }
    }
}

/// Encode a move from absolute cells. `build_at = None` encodes "no build".
pub fn encode_step(
    worker: u8,
    from: Coord,
    to: Coord,
    build_at: Option<Coord>,
) -> Result<Action, CodecError> {
    for cell in [Some(from), Some(to), build_at].into_iter().flatten() {
        if !cell.in_bounds() {
            return Err(CodecError::CellOffBoard(cell));
        }
    }
    let move_dir = Direction::between(from, to).ok_or(CodecError::StepTooLong { from, to })?;
    let build_dir = match build_at {
        None => Direction::CENTER,
        Some(target) => Direction::between(to, target).ok_or(CodecError::StepTooLong {
            from: to,
            to: target,
        })?,
    };
    encode(ActionDescriptor::Move {
        worker,
        move_dir,
        build_dir,
    })
}

/// Human-readable description, e.g. "Move worker 1 ↑ then build ↓".
pub fn describe(action: Action, player: Player) -> Result<String, CodecError> {
    Ok(match decode(action)? {
        ActionDescriptor::Place { cell } => format!("{player} places a worker on {cell}"),
        ActionDescriptor::Move {
            worker,
            move_dir,
            build_dir,
        } if build_dir.is_center() => {
            format!("Move worker {} {} without building", worker + 1, move_dir.arrow())
        }
        ActionDescriptor::Move {
            worker,
            move_dir,
            build_dir,
        } => format!(
            "Move worker {} {} then build {}",
            worker + 1,
            move_dir.arrow(),
            build_dir.arrow()
        ),
    })
}
