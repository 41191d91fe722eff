// Plain-text board dump for logs, test failures, and debugging.
//
// Each cell renders as two characters: a level glyph and a worker marker.
//
//   Round 5, player 1 to move
//      0  1  2  3  4
//   0  ◎1 ◎2 ◎  ◎  ◎
//   1  ◎  ◎  ◎  ◎  ◎
//   ...
//
// Levels: ◎ = ground, ▂ ▅ █ = levels 1 to 3, X = dome. Workers: 1 and 2
// belong to player 0, a and b to player 1.

use crate::snapshot::Snapshot;
use crate::types::{BOARD_SIZE, WorkerId};
use std::fmt::Write;

const LEVEL_GLYPHS: [char; 5] = ['◎', '▂', '▅', '█', 'X'];

fn worker_glyph(id: WorkerId) -> char {
    match id {
        1 => '1',
        2 => '2',
        -1 => 'a',
        -2 => 'b',
        _ => ' ',
    }
}

/// Render `state` as a multi-line string.
#[must_use]
pub fn render_ascii(state: &Snapshot) -> String {
    let mut out = String::new();
    match state.winner() {
        Some(winner) => {
            let _ = writeln!(out, "Round {}, {winner} wins", state.round());
        }
        None => {
            let _ = writeln!(
                out,
                "Round {}, {} to move",
                state.round(),
                state.active_player()
            );
        }
    }

    out.push_str("  ");
    for x in 0..BOARD_SIZE {
        let _ = write!(out, " {x} ");
    }
    out.push('\n');

    for (y, row) in state.board().rows().iter().enumerate() {
        let _ = write!(out, "{y} ");
        for cell in row {
            let glyph = LEVEL_GLYPHS
                .get(cell.level as usize)
                .copied()
                .unwrap_or('?');
            let _ = write!(out, " {glyph}{}", worker_glyph(cell.worker));
        }
        out.push('\n');
    }
    out
}
