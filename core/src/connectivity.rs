//! Connectivity resolver: which orthogonal neighbours of a cell are usable.
//!
//! Two expansion rules exist:
//! - **Corridor** returns walkable neighbours (Open or Marked). The router
//!   uses it to solve an already carved maze.
//! - **Carve** returns wall neighbours that can become corridor without
//!   touching any walkable cell other than the one being extended from.
//!   Excluding only the originating cell is what keeps generated corridors
//!   one cell wide and loop free.

use serde::{Deserialize, Serialize};

use crate::grid::{Coord, Grid};

/// Neighbour expansion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Corridor,
    Carve,
}

/// Up to four neighbours, stored inline.
///
/// Order follows the probe order: north, east, south, west.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    cells: [Coord; 4],
    len: usize,
}

impl Neighbors {
    fn empty() -> Self {
        Self {
            cells: [(0, 0); 4],
            len: 0,
        }
    }

    fn push(&mut self, at: Coord) {
        self.cells[self.len] = at;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Coord] {
        &self.cells[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.as_slice().iter().copied()
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.as_slice().contains(&at)
    }
}

/// In-bounds orthogonal neighbours of `at`, ignoring cell state.
pub fn orthogonal(grid: &Grid, (row, col): Coord) -> Neighbors {
    let mut out = Neighbors::empty();

    // wrapping_sub turns an underflow into an out-of-bounds index
    let probes = [
        (row.wrapping_sub(1), col),
        (row, col + 1),
        (row + 1, col),
        (row, col.wrapping_sub(1)),
    ];

    for probe in probes {
        if grid.in_bounds(probe) {
            out.push(probe);
        }
    }

    out
}

/// Neighbours of `at` that are valid under `mode`.
pub fn neighbors(grid: &Grid, at: Coord, mode: Mode) -> Neighbors {
    let mut out = Neighbors::empty();
    for candidate in orthogonal(grid, at).iter() {
        let keep = match mode {
            Mode::Corridor => grid.is_walkable(candidate),
            Mode::Carve => can_carve(grid, at, candidate),
        };
        if keep {
            out.push(candidate);
        }
    }
    out
}

/// Whether `candidate` may be turned into corridor when extending from `from`.
///
/// The candidate must be a wall, and none of its own walkable neighbours may
/// be anything other than `from` itself.
pub fn can_carve(grid: &Grid, from: Coord, candidate: Coord) -> bool {
    if grid.is_walkable(candidate) {
        return false;
    }
    orthogonal(grid, candidate)
        .iter()
        .all(|touching| touching == from || !grid.is_walkable(touching))
}
