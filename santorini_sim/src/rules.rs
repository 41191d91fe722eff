// Rules engine: legal action enumeration and state transitions.
//
// The engine is a set of pure functions over `Snapshot`:
//
// - `legal_actions(state)` lists every action id the side to move may take,
//   sorted ascending without duplicates.
// - `apply_action(state, action)` validates the action against that list and
//   returns the successor snapshot. The input is never touched.
// - `terminal(state)` reports `(score0, score1)`, `(0, 0)` while undecided.
//
// Placement: player 0 places workers 1 then 2, player 1 places -1 then -2,
// each on any empty cell. After the fourth placement play begins with
// player 0 to move.
//
// Play: a worker moves to an adjacent unoccupied, non-domed cell at most one
// level above its own, then builds on a cell adjacent to its destination
// that is non-domed and unoccupied (the cell it just left counts as
// unoccupied). Reaching level 3 wins immediately and skips the build; those
// moves may also encode the center "no build" direction. A player left
// without a legal action loses; this is checked right after every
// transition so a stuck side never becomes the side to move in a live game.
//
// The `Ruleset` trait is the seam for rule variants. `ClassicRules` is the
// only implementation; the free functions delegate to it.
//
// See also: `codec.rs` for the action encoding, `snapshot.rs` for the state
// type, `game.rs` for undo/redo history on top of these transitions.
//
// **Critical constraint: determinism.** No randomness, no hashing, no I/O.
// Enumeration order is fixed by the codec, so equal inputs give equal
// outputs byte for byte.

use crate::board::{Board, Cell};
use crate::codec::{self, Action, ActionDescriptor};
use crate::error::RulesError;
use crate::snapshot::{MAX_ROUND, PLACEMENT_ORDER, Phase, Snapshot, placing_player};
use crate::types::{Coord, DOME_LEVEL, Direction, Player, WINNING_LEVEL};

/// A complete set of game rules over `Snapshot`.
pub trait Ruleset {
    fn legal_actions(&self, state: &Snapshot) -> Vec<Action>;

    fn apply_action(&self, state: &Snapshot, action: Action) -> Result<Snapshot, RulesError>;

    fn terminal(&self, state: &Snapshot) -> (u8, u8) {
        state.terminal()
    }

    fn is_legal(&self, state: &Snapshot, action: Action) -> bool {
        self.legal_actions(state).binary_search(&action).is_ok()
    }
}

/// Standard rules without god powers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassicRules;

impl Ruleset for ClassicRules {
    fn legal_actions(&self, state: &Snapshot) -> Vec<Action> {
        match state.phase() {
            Phase::Terminal => Vec::new(),
            Phase::Placement { .. } => placement_actions(state.board()),
            Phase::Play => play_actions(state.board(), state.active_player()),
        }
    }

    fn apply_action(&self, state: &Snapshot, action: Action) -> Result<Snapshot, RulesError> {
        if !self.is_legal(state, action) {
            return Err(RulesError::IllegalAction { action: action.0 });
        }
        let round = state.round().saturating_add(1).min(MAX_ROUND);
        let mut board = *state.board();
        let mover = state.active_player();

        match codec::decode(action)? {
            ActionDescriptor::Place { cell } => {
                let placed = board.workers_placed();
                board.set(
                    cell,
                    Cell {
                        worker: PLACEMENT_ORDER[placed],
                        level: 0,
                    },
                );
                let placed = placed + 1;
                if placed < PLACEMENT_ORDER.len() {
                    return Ok(Snapshot::from_parts(board, placing_player(placed), None, round));
                }
                let winner = play_actions(&board, Player::Zero)
                    .is_empty()
                    .then_some(Player::One);
                Ok(Snapshot::from_parts(board, Player::Zero, winner, round))
            }
            ActionDescriptor::Move {
                worker,
                move_dir,
                build_dir,
            } => {
                let id = mover.worker_id(worker);
                let (origin, dest) = board
                    .find_worker(id)
                    .and_then(|from| Some((from, from.step(move_dir)?)))
                    .ok_or(RulesError::IllegalAction { action: action.0 })?;
                let origin_level = board.level(origin).unwrap_or(0);
                let dest_level = board.level(dest).unwrap_or(0);
                board.set(
                    origin,
                    Cell {
                        worker: 0,
                        level: origin_level,
                    },
                );
                board.set(
                    dest,
                    Cell {
                        worker: id,
                        level: dest_level,
                    },
                );

                if dest_level == WINNING_LEVEL {
                    return Ok(Snapshot::from_parts(board, mover, Some(mover), round));
                }

                let target = dest
                    .step(build_dir)
                    .ok_or(RulesError::IllegalAction { action: action.0 })?;
                if let Some(cell) = board.get(target) {
                    board.set(
                        target,
                        Cell {
                            level: (cell.level + 1).min(DOME_LEVEL),
                            ..cell
                        },
                    );
                }

                let next = mover.opponent();
                let winner = play_actions(&board, next).is_empty().then_some(mover);
                Ok(Snapshot::from_parts(board, next, winner, round))
            }
        }
    }
}

/// Legal actions under `ClassicRules`.
pub fn legal_actions(state: &Snapshot) -> Vec<Action> {
    ClassicRules.legal_actions(state)
}

/// Apply `action` under `ClassicRules`.
pub fn apply_action(state: &Snapshot, action: Action) -> Result<Snapshot, RulesError> {
    ClassicRules.apply_action(state, action)
}

/// Scores under `ClassicRules`.
pub fn terminal(state: &Snapshot) -> (u8, u8) {
    ClassicRules.terminal(state)
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

fn placement_actions(board: &Board) -> Vec<Action> {
    board
        .iter()
        .filter(|(_, c)| !c.is_occupied() && !c.is_domed())
        .map(|(pos, _)| Action(pos.index() as u16))
        .collect()
}

fn play_actions(board: &Board, player: Player) -> Vec<Action> {
    let mut actions = Vec::new();
    for (worker, origin) in board.workers_of(player).into_iter().enumerate() {
        let Some(origin) = origin else { continue };
        let origin_level = board.level(origin).unwrap_or(0);
        for move_dir in Direction::neighbors() {
            let Some(dest) = origin.step(move_dir) else {
                continue;
            };
            if !board.is_free(dest) || board.level(dest).unwrap_or(0) > origin_level + 1 {
                continue;
            }
            let winning = board.level(dest) == Some(WINNING_LEVEL);
            for build in 0..Direction::COUNT {
                let Some(build_dir) = Direction::new(build) else {
                    continue;
                };
                let legal = if build_dir.is_center() {
                    winning
                } else {
                    dest.step(build_dir)
                        .is_some_and(|target| buildable(board, target, origin))
                };
                if legal {
                    actions.push(Action(
                        codec::PLACEMENT_ACTIONS
                            + worker as u16 * codec::MOVES_PER_WORKER
                            + move_dir.value() as u16 * 9
                            + build_dir.value() as u16,
                    ));
                }
            }
        }
    }
    debug_assert!(actions.windows(2).all(|w| w[0] < w[1]));
    actions
}

/// A build target must be non-domed and empty, except that the cell the
/// moving worker just vacated counts as empty.
fn buildable(board: &Board, target: Coord, vacated: Coord) -> bool {
    board
        .get(target)
        .is_some_and(|c| !c.is_domed() && (!c.is_occupied() || target == vacated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotRecord;

    fn play(actions: &[u16]) -> Snapshot {
        actions.iter().fold(Snapshot::initial(), |s, &a| {
            apply_action(&s, Action(a)).unwrap()
        })
    }

    /// Build a play-phase snapshot from a record edited by `edit`.
    fn position(edit: impl FnOnce(&mut SnapshotRecord)) -> Snapshot {
        let mut record = Snapshot::initial().to_record();
        edit(&mut record);
        Snapshot::from_record(&record).unwrap()
    }

    #[test]
    fn placement_sequence_enters_play() {
        let state = play(&[0, 1, 24, 23]);
        let board = state.board();
        assert_eq!(board.find_worker(1), Some(Coord::new(0, 0)));
        assert_eq!(board.find_worker(2), Some(Coord::new(0, 1)));
        assert_eq!(board.find_worker(-1), Some(Coord::new(4, 4)));
        assert_eq!(board.find_worker(-2), Some(Coord::new(4, 3)));
        assert_eq!(state.active_player(), Player::Zero);
        assert_eq!(state.phase(), Phase::Play);
        assert_eq!(state.round(), 4);
    }

    #[test]
    fn placement_alternates_in_pairs() {
        let s1 = play(&[0]);
        assert_eq!(s1.active_player(), Player::Zero);
        let s2 = play(&[0, 1]);
        assert_eq!(s2.active_player(), Player::One);
        assert_eq!(s2.phase(), Phase::Placement { workers_placed: 2 });
        assert_eq!(legal_actions(&s2).len(), 23);
    }

    #[test]
    fn placement_on_occupied_cell_is_illegal() {
        let s1 = play(&[0]);
        let err = apply_action(&s1, Action(0)).unwrap_err();
        assert!(matches!(err, RulesError::IllegalAction { action: 0 }));
    }

    #[test]
    fn move_and_build_onto_vacated_cell() {
        // Worker 1 at (2, 2): up to (1, 2), build down onto (2, 2).
        let before = play(&[12, 1, 24, 23]);
        assert!(legal_actions(&before).contains(&Action(41)));
        let after = apply_action(&before, Action(41)).unwrap();
        assert_eq!(after.board().find_worker(1), Some(Coord::new(1, 2)));
        assert_eq!(after.board().level(Coord::new(2, 2)), Some(1));
        assert_eq!(after.active_player(), Player::One);
        assert_eq!(after.terminal(), (0, 0));
        // Input untouched.
        assert_eq!(before.board().find_worker(1), Some(Coord::new(2, 2)));
    }

    #[test]
    fn climbing_to_level_three_wins_without_building() {
        let state = position(|r| {
            r.board[2][2] = [1, 2, 0];
            r.board[1][2] = [0, 3, 0];
            r.board[0][0][0] = 2;
            r.board[4][4][0] = -1;
            r.board[4][3][0] = -2;
        });
        let actions = legal_actions(&state);
        // Up with build down, and up with no build, are both legal.
        assert!(actions.contains(&Action(41)));
        assert!(actions.contains(&Action(25 + 9 + 4)));
        for action in [Action(41), Action(25 + 9 + 4)] {
            let after = apply_action(&state, action).unwrap();
            assert_eq!(after.terminal(), (1, 0));
            assert_eq!(after.phase(), Phase::Terminal);
            assert_eq!(after.board().level(Coord::new(2, 2)), Some(2));
            assert!(legal_actions(&after).is_empty());
        }
    }

    #[test]
    fn no_build_is_illegal_below_level_three() {
        let state = play(&[12, 1, 24, 23]);
        assert!(!legal_actions(&state).contains(&Action(25 + 9 + 4)));
    }

    #[test]
    fn cannot_climb_two_levels_or_onto_domes() {
        let state = position(|r| {
            r.board[2][2] = [1, 0, 0];
            r.board[1][2] = [0, 2, 0];
            r.board[1][1] = [0, 4, 0];
            r.board[0][0][0] = 2;
            r.board[4][4][0] = -1;
            r.board[4][3][0] = -2;
        });
        let blocked: Vec<Direction> = [0u8, 1]
            .iter()
            .filter_map(|&d| Direction::new(d))
            .collect();
        for action in legal_actions(&state) {
            if let Ok(ActionDescriptor::Move {
                worker: 0,
                move_dir,
                ..
            }) = codec::decode(action)
            {
                assert!(!blocked.contains(&move_dir));
            }
        }
    }

    #[test]
    fn cannot_build_on_domes_or_workers() {
        let state = position(|r| {
            r.board[2][2] = [1, 0, 0];
            r.board[0][2] = [0, 4, 0];
            r.board[0][1][0] = 2;
            r.board[4][4][0] = -1;
            r.board[4][3][0] = -2;
        });
        // Worker 1 moves up to (1, 2); (0, 2) is domed, (0, 1) has worker 2.
        let up = Direction::UP.value() as u16;
        assert!(!legal_actions(&state).contains(&Action(25 + up * 9 + 1)));
        assert!(!legal_actions(&state).contains(&Action(25 + up * 9)));
        assert!(legal_actions(&state).contains(&Action(25 + up * 9 + 3)));
    }

    #[test]
    fn building_caps_at_dome() {
        let state = position(|r| {
            r.board[2][2] = [1, 0, 0];
            r.board[3][2] = [0, 3, 0];
            r.board[0][0][0] = 2;
            r.board[4][4][0] = -1;
            r.board[4][3][0] = -2;
        });
        // Worker 1 moves right to (2, 3) and builds down-left onto (3, 2).
        let right = 5u16;
        let down_left = 6u16;
        let after = apply_action(&state, Action(25 + right * 9 + down_left)).unwrap();
        assert_eq!(after.board().level(Coord::new(3, 2)), Some(DOME_LEVEL));
        assert!(after.board().get(Coord::new(3, 2)).unwrap().is_domed());
    }

    #[test]
    fn opponent_without_moves_loses() {
        // Player 1's corner workers can only escape through (3, 3).
        let state = position(|r| {
            r.board[4][4] = [-1, 0, 0];
            r.board[4][3] = [-2, 0, 0];
            r.board[3][4] = [0, 4, 0];
            r.board[4][2] = [0, 4, 0];
            r.board[3][2] = [0, 4, 0];
            r.board[3][3] = [0, 1, 0];
            r.board[2][2] = [1, 0, 0];
            r.board[0][0][0] = 2;
        });
        assert_eq!(state.terminal(), (0, 0));
        // Worker 1 moves right to (2, 3) and builds down onto (3, 3).
        let right = 5u16;
        let down = 7u16;
        let after = apply_action(&state, Action(25 + right * 9 + down)).unwrap();
        assert_eq!(after.board().level(Coord::new(3, 3)), Some(2));
        assert_eq!(after.terminal(), (1, 0));
        assert!(legal_actions(&after).is_empty());
    }

    #[test]
    fn terminal_state_rejects_everything() {
        let state = position(|r| {
            r.board[2][2] = [1, 2, 0];
            r.board[1][2] = [0, 3, 0];
            r.board[0][0][0] = 2;
            r.board[4][4][0] = -1;
            r.board[4][3][0] = -2;
        });
        let over = apply_action(&state, Action(41)).unwrap();
        assert_eq!(terminal(&over), (1, 0));
        for a in 0..codec::ACTION_COUNT {
            assert!(apply_action(&over, Action(a)).is_err());
        }
    }

    #[test]
    fn out_of_range_action_is_illegal() {
        let state = play(&[12, 1, 24, 23]);
        assert!(apply_action(&state, Action(500)).is_err());
    }

    #[test]
    fn legal_actions_are_sorted_and_unique() {
        let state = play(&[12, 1, 24, 23]);
        let actions = legal_actions(&state);
        assert!(!actions.is_empty());
        assert!(actions.windows(2).all(|w| w[0] < w[1]));
    }
}
