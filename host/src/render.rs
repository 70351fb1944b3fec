//! Plain-text maze rendering for terminals.
//!
//! `#` wall, `.` open, `*` marked, `S` start, `E` end.

use maze_core::{Cell, Maze};

pub fn render(maze: &Maze) -> String {
    let dim = maze.dim();
    let mut out = String::with_capacity(dim * (dim + 1));
    for row in 0..dim {
        for col in 0..dim {
            let glyph = if (row, col) == maze.start() {
                'S'
            } else if (row, col) == maze.end() {
                'E'
            } else {
                match maze.get(row, col) {
                    Cell::Open => '.',
                    Cell::Wall => '#',
                    Cell::Marked => '*',
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
