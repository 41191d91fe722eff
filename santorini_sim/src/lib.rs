// santorini_sim — pure Rust rules library for the Santorini board game.
//
// This crate contains all game logic: the board model, the integer action
// codec, the rules engine, undo/redo history, the click-driven move
// selector, snapshot serialization, and a text renderer for debugging. It
// does no I/O and has no knowledge of ledgers, networking, or clocks; the
// `santorini_sync` crate layers those on top.
//
// Module overview:
// - `types.rs`:    Coord, Player, worker ids, Direction, board constants.
// - `board.rs`:    Dense 5×5 grid of Cells (worker id + level).
// - `codec.rs`:    Action ids in [0, 187) ⇄ ActionDescriptor; describe().
// - `rules.rs`:    Ruleset trait + ClassicRules: legal_actions, apply_action, terminal.
// - `snapshot.rs`: Immutable Snapshot, Phase, canonical JSON import/export.
// - `game.rs`:     Game: snapshot history with undo/redo and turn revert.
// - `selector.rs`: MoveSelector: worker → destination → build click flow.
// - `render.rs`:   Plain-text board dump.
// - `error.rs`:    RulesError, CodecError, SnapshotError.
//
// **Critical constraint: determinism.** Every function here is a pure
// function of its inputs. No `HashMap`, no system time, no randomness.
// Replaying the same actions from the same snapshot always yields the same
// snapshot, which is what lets every client agree with the move ledger.

pub mod board;
pub mod codec;
pub mod error;
pub mod game;
pub mod render;
pub mod rules;
pub mod selector;
pub mod snapshot;
pub mod types;

pub use codec::Action;
pub use error::{CodecError, RulesError, SnapshotError};
pub use game::Game;
pub use rules::{ClassicRules, Ruleset};
pub use snapshot::{Phase, Snapshot};
