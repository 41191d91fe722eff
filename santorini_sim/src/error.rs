// Error types for the rules engine, move codec, and snapshot import.
//
// All three are local, recoverable failures: the caller's state is never
// changed when one is returned. `RulesError` wraps the other two so callers
// that go through `Game` or `Ruleset` only need to match one type.

use crate::types::Coord;
use thiserror::Error;

/// An action id or descriptor that lies outside the encodable space.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("action {0} is outside the action space [0, 187)")]
    ActionOutOfRange(u16),
    #[error("worker index {0} is not 0 or 1")]
    WorkerOutOfRange(u8),
    #[error("direction {0} is not in 0..9")]
    DirectionOutOfRange(u8),
    #[error("cell {0} is off the board")]
    CellOffBoard(Coord),
    #[error("step from {from} to {to} is longer than one cell")]
    StepTooLong { from: Coord, to: Coord },
}

/// Why a serialized snapshot was rejected.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
    #[error("cell {cell}: worker id {value} out of range")]
    WorkerId { cell: Coord, value: i32 },
    #[error("cell {cell}: level {value} out of range")]
    Level { cell: Coord, value: i32 },
    #[error("cell {cell}: reserved value {value} must be 0")]
    Reserved { cell: Coord, value: i32 },
    #[error("round counter {0} out of range")]
    Round(i32),
    #[error("worker id {0} appears more than once")]
    DuplicateWorker(i8),
    #[error("domed cell {0} holds a worker")]
    WorkerOnDome(Coord),
    #[error("workers are not placed in order (worker id {0} present without its predecessors)")]
    PlacementOrder(i8),
    #[error("active player {0} is not 0 or 1")]
    ActivePlayer(i32),
    #[error("workers of both players stand on the winning level")]
    ConflictingWinners,
    #[error("active player does not match the placement progress")]
    ActivePlayerMismatch,
}

/// Failure to apply an action.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("action {action} is not legal in this position")]
    IllegalAction { action: u16 },
    #[error(transparent)]
    Codec(#[from] CodecError),
}
