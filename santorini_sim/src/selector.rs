// Click-driven move selector.
//
// Turns a sequence of cell clicks into one encoded action. In placement a
// single click on a legal cell completes. In play the user clicks one of
// their workers, then a destination, then a build target; clicking the
// destination itself as the build target means "no build" (only legal on a
// winning climb). A click that is not a legal continuation of the partial
// selection is rejected and leaves the selection as it was.
//
// Nothing is cached: every click and every `selectable()` query filters
// `legal_actions()` of the snapshot passed in, so the selector can never
// disagree with the rules engine. Callers reset it whenever the underlying
// snapshot changes.
//
// See also: `rules.rs` for `legal_actions()`, `codec.rs` for decoding the
// candidates.

use crate::codec::{self, Action, ActionDescriptor};
use crate::rules;
use crate::snapshot::Snapshot;
use crate::types::{BOARD_SIZE, Coord};

/// Progress through a three-click play-phase selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionStage {
    #[default]
    Idle,
    WorkerChosen {
        worker: u8,
        from: Coord,
    },
    DestinationChosen {
        worker: u8,
        from: Coord,
        to: Coord,
    },
}

/// Result of one click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Accepted; more clicks are needed.
    Pending,
    /// Not a legal continuation; nothing changed.
    Rejected,
    /// The selection is complete and the selector is idle again.
    Complete(Action),
}

/// What happens if a given cell is clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Advance(SelectionStage),
    Finish(Action),
}

#[derive(Clone, Debug, Default)]
pub struct MoveSelector {
    stage: SelectionStage,
}

impl MoveSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> SelectionStage {
        self.stage
    }

    pub fn reset(&mut self) {
        self.stage = SelectionStage::Idle;
    }

    pub fn click(&mut self, state: &Snapshot, cell: Coord) -> Selection {
        let step = self
            .options(state)
            .into_iter()
            .find_map(|(target, step)| (target == cell).then_some(step));
        match step {
            None => Selection::Rejected,
            Some(Step::Advance(stage)) => {
                self.stage = stage;
                Selection::Pending
            }
            Some(Step::Finish(action)) => {
                self.stage = SelectionStage::Idle;
                Selection::Complete(action)
            }
        }
    }

    /// Cells that a click would currently accept, indexed `[y][x]`.
    pub fn selectable(&self, state: &Snapshot) -> [[bool; BOARD_SIZE]; BOARD_SIZE] {
        let mut grid = [[false; BOARD_SIZE]; BOARD_SIZE];
        for (cell, _) in self.options(state) {
            grid[cell.y as usize][cell.x as usize] = true;
        }
        grid
    }

    /// Every clickable cell with its effect. A cell may appear more than
    /// once (one entry per legal action through it); the first wins, and
    /// all entries for a cell are equivalent except at the final click,
    /// where each cell maps to exactly one action.
    fn options(&self, state: &Snapshot) -> Vec<(Coord, Step)> {
        let board = state.board();
        let player = state.active_player();
        let mut options = Vec::new();
        for action in rules::legal_actions(state) {
            let Ok(descriptor) = codec::decode(action) else {
                continue;
            };
            match descriptor {
                ActionDescriptor::Place { cell } => {
                    if self.stage == SelectionStage::Idle {
                        options.push((cell, Step::Finish(action)));
                    }
                }
                ActionDescriptor::Move {
                    worker,
                    move_dir,
                    build_dir,
                } => {
                    let Some(from) = board.find_worker(player.worker_id(worker)) else {
                        continue;
                    };
                    let Some(to) = from.step(move_dir) else {
                        continue;
                    };
                    let Some(build_at) = to.step(build_dir) else {
                        continue;
                    };
                    match self.stage {
                        SelectionStage::Idle => options.push((
                            from,
                            Step::Advance(SelectionStage::WorkerChosen { worker, from }),
                        )),
                        SelectionStage::WorkerChosen { worker: w, .. } if w == worker => {
                            options.push((
                                to,
                                Step::Advance(SelectionStage::DestinationChosen {
                                    worker,
                                    from,
                                    to,
                                }),
                            ))
                        }
                        SelectionStage::DestinationChosen {
                            worker: w, to: t, ..
                        } if w == worker && t == to => {
                            options.push((build_at, Step::Finish(action)))
                        }
                        _ => {}
                    }
                }
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;

    fn play(actions: &[u16]) -> Snapshot {
        actions.iter().fold(Snapshot::initial(), |s, &a| {
            rules::apply_action(&s, Action(a)).unwrap()
        })
    }

    #[test]
    fn placement_completes_in_one_click() {
        let mut selector = MoveSelector::new();
        let state = play(&[0]);
        assert_eq!(selector.click(&state, Coord::new(0, 0)), Selection::Rejected);
        assert_eq!(
            selector.click(&state, Coord::new(1, 1)),
            Selection::Complete(Action(6))
        );
        assert_eq!(selector.stage(), SelectionStage::Idle);
    }

    #[test]
    fn three_clicks_build_a_move() {
        let mut selector = MoveSelector::new();
        let state = play(&[12, 1, 24, 23]);
        assert_eq!(selector.click(&state, Coord::new(2, 2)), Selection::Pending);
        assert_eq!(selector.click(&state, Coord::new(1, 2)), Selection::Pending);
        assert_eq!(
            selector.click(&state, Coord::new(2, 2)),
            Selection::Complete(Action(41))
        );
        assert_eq!(selector.stage(), SelectionStage::Idle);
    }

    #[test]
    fn opponent_worker_and_far_cells_are_rejected() {
        let mut selector = MoveSelector::new();
        let state = play(&[12, 1, 24, 23]);
        assert_eq!(state.active_player(), Player::Zero);
        assert_eq!(selector.click(&state, Coord::new(4, 4)), Selection::Rejected);
        assert_eq!(selector.click(&state, Coord::new(3, 3)), Selection::Rejected);
        assert_eq!(selector.click(&state, Coord::new(2, 2)), Selection::Pending);
        assert_eq!(selector.click(&state, Coord::new(4, 2)), Selection::Rejected);
        assert!(matches!(
            selector.stage(),
            SelectionStage::WorkerChosen { worker: 0, .. }
        ));
    }

    #[test]
    fn clicking_destination_is_no_build_only_on_winning_climb() {
        let mut record = Snapshot::initial().to_record();
        record.board[2][2] = [1, 2, 0];
        record.board[1][2] = [0, 3, 0];
        record.board[0][0][0] = 2;
        record.board[4][4][0] = -1;
        record.board[4][3][0] = -2;
        let state = Snapshot::from_record(&record).unwrap();

        let mut selector = MoveSelector::new();
        selector.click(&state, Coord::new(2, 2));
        selector.click(&state, Coord::new(1, 2));
        assert_eq!(
            selector.click(&state, Coord::new(1, 2)),
            Selection::Complete(Action(25 + 9 + 4))
        );

        let plain = play(&[12, 1, 24, 23]);
        selector.click(&plain, Coord::new(2, 2));
        selector.click(&plain, Coord::new(1, 2));
        assert_eq!(selector.click(&plain, Coord::new(1, 2)), Selection::Rejected);
    }

    #[test]
    fn selectable_follows_the_partial_selection() {
        let mut selector = MoveSelector::new();
        let state = play(&[12, 1, 24, 23]);
        let idle = selector.selectable(&state);
        let idle_cells: usize = idle.iter().flatten().filter(|&&b| b).count();
        assert_eq!(idle_cells, 2);
        assert!(idle[2][2] && idle[0][1]);

        selector.click(&state, Coord::new(2, 2));
        let dests = selector.selectable(&state);
        assert_eq!(dests.iter().flatten().filter(|&&b| b).count(), 8);
        assert!(!dests[2][2]);

        selector.reset();
        assert_eq!(selector.selectable(&state), idle);
    }

    #[test]
    fn terminal_state_selects_nothing() {
        let mut record = Snapshot::initial().to_record();
        record.board[1][2] = [1, 3, 0];
        record.board[0][0][0] = 2;
        record.board[4][4][0] = -1;
        record.board[4][3][0] = -2;
        let state = Snapshot::from_record(&record).unwrap();
        let selector = MoveSelector::new();
        assert!(state.is_terminal());
        assert!(selector.selectable(&state).iter().flatten().all(|&b| !b));
    }
}
