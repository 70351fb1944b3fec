//! Single-cell edits made by a builder or a player.
//!
//! Out-of-bounds requests are ignored and reported as `false` /
//! [`Trace::Rejected`], matching how a pointer outside the board is treated.

use serde::{Deserialize, Serialize};

use crate::connectivity;
use crate::grid::{Cell, Coord};
use crate::maze::Maze;

/// What a builder paints onto a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brush {
    Wall,
    Open,
}

/// Result of a player laying a path cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trace {
    Rejected,
    Placed,
    /// The cell placed was `end`.
    Won,
}

impl Maze {
    /// Paint one cell in build mode. Endpoints cannot be painted over.
    pub fn paint(&mut self, at: Coord, brush: Brush) -> bool {
        if !self.grid().in_bounds(at) || at == self.start() || at == self.end() {
            return false;
        }
        let cell = match brush {
            Brush::Wall => Cell::Wall,
            Brush::Open => Cell::Open,
        };
        self.set(at.0, at.1, cell);
        true
    }

    /// Move the start onto an open cell.
    pub fn place_start(&mut self, at: Coord) -> bool {
        if self.grid().try_get(at) != Some(Cell::Open) {
            return false;
        }
        self.set_endpoints(at, self.end());
        true
    }

    /// Move the end onto an open cell.
    pub fn place_end(&mut self, at: Coord) -> bool {
        if self.grid().try_get(at) != Some(Cell::Open) {
            return false;
        }
        self.set_endpoints(self.start(), at);
        true
    }

    /// Lay a path cell in play mode.
    ///
    /// The cell must be walkable and touch either `start` or a cell already
    /// marked, so the trace always grows as one connected line.
    pub fn trace(&mut self, at: Coord) -> Trace {
        match self.grid().try_get(at) {
            Some(Cell::Open) | Some(Cell::Marked) => {}
            _ => return Trace::Rejected,
        }

        let grid = self.grid();
        let connected = at == self.start()
            || connectivity::orthogonal(grid, at)
                .iter()
                .any(|n| n == self.start() || grid.get(n.0, n.1) == Cell::Marked);
        if !connected {
            return Trace::Rejected;
        }

        self.set(at.0, at.1, Cell::Marked);
        if at == self.end() {
            tracing::info!("Maze '{}' completed", self.name);
            Trace::Won
        } else {
            Trace::Placed
        }
    }

    /// Undo a traced cell. Walls and open cells are left alone.
    pub fn erase_trace(&mut self, at: Coord) -> bool {
        if self.grid().try_get(at) != Some(Cell::Marked) {
            return false;
        }
        self.set(at.0, at.1, Cell::Open);
        true
    }

    /// Remove every mark, restoring the unplayed maze.
    pub fn clear_trace(&mut self) {
        self.grid_mut().replace(Cell::Marked, Cell::Open);
    }
}
