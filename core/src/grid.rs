//! Square cell matrix shared by the router, the generator and the editor.

use serde::{Deserialize, Serialize};

use crate::error::MazeError;
use crate::{MAX_DIM, MIN_DIM};

/// `(row, col)` position inside a grid.
pub type Coord = (usize, usize);

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Open,
    Wall,
    /// On a traced or displayed path. Walkable, exactly like `Open`.
    Marked,
}

impl Cell {
    /// Open and Marked cells can be walked; walls cannot.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Cell::Wall)
    }

    /// Numeric code used by fixtures and the wire format (0 = open, 1 = wall, 2 = marked).
    pub fn code(self) -> u8 {
        match self {
            Cell::Open => 0,
            Cell::Wall => 1,
            Cell::Marked => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, MazeError> {
        match code {
            0 => Ok(Cell::Open),
            1 => Ok(Cell::Wall),
            2 => Ok(Cell::Marked),
            _ => Err(MazeError::InvalidCellCode { code }),
        }
    }
}

/// Row-major `dim x dim` matrix of cells.
///
/// `get` and `set` index directly and panic outside `[0, dim)`; callers that
/// cannot guarantee bounds use [`Grid::in_bounds`] or [`Grid::try_get`] first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    dim: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// All-open grid of side `dim`.
    pub fn new(dim: usize) -> Result<Self, MazeError> {
        Self::filled(dim, Cell::Open)
    }

    pub fn filled(dim: usize, cell: Cell) -> Result<Self, MazeError> {
        check_dim(dim)?;
        Ok(Self {
            dim,
            cells: vec![cell; dim * dim],
        })
    }

    /// Build a grid from numeric rows (0 = open, 1 = wall, 2 = marked).
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, MazeError> {
        let dim = rows.len();
        check_dim(dim)?;

        let mut cells = Vec::with_capacity(dim * dim);
        for row in rows {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(MazeError::NotSquare {
                    rows: dim,
                    cols: row.len(),
                });
            }
            for &code in row {
                cells.push(Cell::from_code(code)?);
            }
        }

        Ok(Self { dim, cells })
    }

    /// Numeric rows, the inverse of [`Grid::from_rows`].
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.dim)
            .map(|row| row.iter().map(|cell| cell.code()).collect())
            .collect()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn in_bounds(&self, (row, col): Coord) -> bool {
        row < self.dim && col < self.dim
    }

    /// Error unless `at` lies inside the grid.
    pub fn check_bounds(&self, at: Coord) -> Result<(), MazeError> {
        if self.in_bounds(at) {
            Ok(())
        } else {
            Err(MazeError::OutOfBounds {
                row: at.0,
                col: at.1,
                dim: self.dim,
            })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        assert!(self.in_bounds((row, col)), "({row}, {col}) outside {0}x{0} grid", self.dim);
        self.cells[row * self.dim + col]
    }

    pub fn try_get(&self, at: Coord) -> Option<Cell> {
        if self.in_bounds(at) {
            Some(self.cells[at.0 * self.dim + at.1])
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        assert!(self.in_bounds((row, col)), "({row}, {col}) outside {0}x{0} grid", self.dim);
        self.cells[row * self.dim + col] = cell;
    }

    pub fn is_walkable(&self, (row, col): Coord) -> bool {
        self.get(row, col).is_walkable()
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Replace every `from` cell with `to`.
    pub fn replace(&mut self, from: Cell, to: Cell) {
        for cell in self.cells.iter_mut().filter(|cell| **cell == from) {
            *cell = to;
        }
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    /// New grid of side `new_dim` holding the overlapping top-left block of
    /// this one; cells outside the old bounds start `Open`.
    pub fn resized(&self, new_dim: usize) -> Result<Self, MazeError> {
        let mut resized = Self::new(new_dim)?;
        let overlap = self.dim.min(new_dim);
        for row in 0..overlap {
            let src = row * self.dim;
            let dst = row * new_dim;
            resized.cells[dst..dst + overlap].copy_from_slice(&self.cells[src..src + overlap]);
        }
        Ok(resized)
    }

    /// Structural check for deserialised grids.
    pub fn validate(&self) -> Result<(), MazeError> {
        check_dim(self.dim)?;
        if self.cells.len() != self.dim * self.dim {
            return Err(MazeError::NotSquare {
                rows: self.dim,
                cols: self.cells.len() / self.dim,
            });
        }
        Ok(())
    }
}

/// Side lengths outside `MIN_DIM..=MAX_DIM` are refused everywhere a grid is
/// built or accepted, which also keeps `dim * dim` far from overflow.
fn check_dim(dim: usize) -> Result<(), MazeError> {
    if (MIN_DIM..=MAX_DIM).contains(&dim) {
        Ok(())
    } else {
        Err(MazeError::InvalidDimension { dim })
    }
}

/// Straight-line distance between two coordinates.
pub fn euclidean((r1, c1): Coord, (r2, c2): Coord) -> f64 {
    let dr = r1.abs_diff(r2) as f64;
    let dc = c1.abs_diff(c2) as f64;
    (dr * dr + dc * dc).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_open() {
        let grid = Grid::new(6).unwrap();
        assert_eq!(grid.dim(), 6);
        assert_eq!(grid.count(Cell::Open), 36);
    }

    #[test]
    fn test_dimension_range() {
        assert_eq!(Grid::new(4), Err(MazeError::InvalidDimension { dim: 4 }));
        assert!(Grid::new(5).is_ok());
        assert!(Grid::new(MAX_DIM).is_ok());
        assert_eq!(
            Grid::new(MAX_DIM + 1),
            Err(MazeError::InvalidDimension { dim: MAX_DIM + 1 })
        );
    }

    #[test]
    fn test_validate_refuses_oversized_deserialised_grid() {
        let huge: Grid = serde_json::from_str(r#"{"dim": 8589934592, "cells": []}"#).unwrap();
        assert_eq!(huge.validate(), Err(MazeError::InvalidDimension { dim: 8589934592 }));

        let short: Grid = serde_json::from_str(r#"{"dim": 5, "cells": ["open"]}"#).unwrap();
        assert_eq!(short.validate(), Err(MazeError::NotSquare { rows: 5, cols: 0 }));
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let rows: [&[u8]; 5] = [&[0; 5], &[0; 5], &[0; 4], &[0; 5], &[0; 5]];
        assert_eq!(
            Grid::from_rows(&rows),
            Err(MazeError::NotSquare { rows: 5, cols: 4 })
        );
    }

    #[test]
    fn test_from_rows_rejects_unknown_code() {
        let mut rows = vec![vec![0u8; 5]; 5];
        rows[2][3] = 7;
        assert_eq!(Grid::from_rows(&rows), Err(MazeError::InvalidCellCode { code: 7 }));
    }

    #[test]
    fn test_rows_round_trip() {
        let rows: [[u8; 5]; 5] = [
            [0, 1, 0, 0, 0],
            [1, 1, 0, 1, 0],
            [0, 1, 2, 1, 0],
            [0, 1, 0, 1, 0],
            [0, 0, 0, 1, 0],
        ];
        let grid = Grid::from_rows(&rows).unwrap();
        assert_eq!(grid.get(0, 1), Cell::Wall);
        assert_eq!(grid.get(2, 2), Cell::Marked);
        assert_eq!(grid.to_rows(), rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>());
    }

    #[test]
    fn test_bounds() {
        let grid = Grid::new(5).unwrap();
        assert!(grid.in_bounds((4, 4)));
        assert!(!grid.in_bounds((5, 0)));
        assert_eq!(grid.try_get((0, 5)), None);
        assert_eq!(
            grid.check_bounds((7, 1)),
            Err(MazeError::OutOfBounds { row: 7, col: 1, dim: 5 })
        );
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_bounds_panics() {
        let grid = Grid::new(5).unwrap();
        grid.get(5, 0);
    }

    #[test]
    fn test_marked_is_walkable() {
        assert!(Cell::Open.is_walkable());
        assert!(Cell::Marked.is_walkable());
        assert!(!Cell::Wall.is_walkable());
    }

    #[test]
    fn test_euclidean() {
        assert_eq!(euclidean((0, 0), (3, 4)), 5.0);
        assert_eq!(euclidean((4, 4), (1, 0)), 5.0);
    }
}
