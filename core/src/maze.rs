//! Maze metadata layered over a [`Grid`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::connectivity::Mode;
use crate::error::MazeError;
use crate::generator::{GenerationStats, Generator};
use crate::grid::{Cell, Coord, Grid};
use crate::router;

/// Generation difficulty.
///
/// Harder settings take the move closest to the exit less often and grow
/// more decorative branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Chance, in thousandths, that a carving step takes the candidate closest to the exit.
    pub fn best_move_permille(self) -> u16 {
        match self {
            Difficulty::Easy => 850,
            Difficulty::Medium => 600,
            Difficulty::Hard => 350,
        }
    }

    /// Chance, in thousandths, that a processed corridor cell sprouts a branch.
    pub fn branch_permille(self) -> u16 {
        match self {
            Difficulty::Easy => 550,
            Difficulty::Medium => 750,
            Difficulty::Hard => 950,
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" | "0" => Ok(Difficulty::Easy),
            "medium" | "1" => Ok(Difficulty::Medium),
            "hard" | "2" => Ok(Difficulty::Hard),
            _ => Err(format!("Invalid difficulty: '{}'. Must be 'easy', 'medium', or 'hard'", s)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// A named, square maze.
///
/// `start` and `end` always lie inside the grid and are never walls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    pub name: String,
    pub difficulty: Difficulty,
    grid: Grid,
    start: Coord,
    end: Coord,
}

impl Maze {
    /// All-open maze with the start in the top-left and the end in the bottom-right corner.
    pub fn new(name: impl Into<String>, dim: usize, difficulty: Difficulty) -> Result<Self, MazeError> {
        let grid = Grid::new(dim)?;
        Ok(Self {
            name: name.into(),
            difficulty,
            grid,
            start: (0, 0),
            end: (dim - 1, dim - 1),
        })
    }

    /// Wrap an existing grid. Both endpoints must be in bounds and walkable.
    pub fn from_grid(
        name: impl Into<String>,
        difficulty: Difficulty,
        grid: Grid,
        start: Coord,
        end: Coord,
    ) -> Result<Self, MazeError> {
        let maze = Self {
            name: name.into(),
            difficulty,
            grid,
            start,
            end,
        };
        maze.validate()?;
        Ok(maze)
    }

    /// Re-check every invariant, used after deserialisation.
    pub fn validate(&self) -> Result<(), MazeError> {
        self.grid.validate()?;
        for endpoint in [self.start, self.end] {
            self.grid.check_bounds(endpoint)?;
            if !self.grid.is_walkable(endpoint) {
                return Err(MazeError::EndpointBlocked {
                    row: endpoint.0,
                    col: endpoint.1,
                });
            }
        }
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.grid.dim()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid access for collaborators that manage cells themselves.
    ///
    /// Writing a wall onto `start` or `end` breaks the endpoint invariant;
    /// the editor operations in [`crate::editor`] refuse to do that.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.grid.get(row, col)
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.grid.set(row, col, cell);
    }

    pub(crate) fn set_endpoints(&mut self, start: Coord, end: Coord) {
        self.start = start;
        self.end = end;
    }

    /// Change the side length, keeping the overlapping top-left block.
    ///
    /// Growing moves `end` to the new far corner; shrinking clamps both
    /// endpoints into range. Either way both endpoints end up `Open`.
    pub fn resize(&mut self, new_dim: usize) -> Result<(), MazeError> {
        let old_dim = self.dim();
        let grid = self.grid.resized(new_dim)?;
        let clamp = |(row, col): Coord| (row.min(new_dim - 1), col.min(new_dim - 1));

        self.grid = grid;
        self.start = clamp(self.start);
        self.end = if new_dim > old_dim {
            (new_dim - 1, new_dim - 1)
        } else {
            clamp(self.end)
        };
        self.grid.set(self.start.0, self.start.1, Cell::Open);
        self.grid.set(self.end.0, self.end.1, Cell::Open);

        tracing::debug!(
            "Resized maze '{}' from {} to {} (start {:?}, end {:?})",
            self.name,
            old_dim,
            new_dim,
            self.start,
            self.end
        );
        Ok(())
    }

    /// One-shot corridor route from `start` to `end`.
    pub fn is_solvable(&self) -> bool {
        // Endpoints are in bounds by invariant, so routing cannot fail.
        router::route(&self.grid, self.start, self.end, Mode::Corridor).unwrap_or(false)
    }

    /// Shortest corridor path from `start` to `end`, if one exists.
    pub fn solve(&self) -> Option<Vec<Coord>> {
        router::find_path(&self.grid, self.start, self.end, Mode::Corridor)
            .ok()
            .flatten()
    }

    /// Rewrite the grid into a fresh solvable layout derived from `seed`.
    pub fn randomize(&mut self, seed: u32) -> Result<GenerationStats, MazeError> {
        Generator::new(seed).generate(self)
    }

    /// Paint `path` as `Marked` so a renderer can show it. Walls are left alone.
    pub fn mark_path(&mut self, path: &[Coord]) {
        for &(row, col) in path {
            if self.grid.try_get((row, col)) == Some(Cell::Open) {
                self.grid.set(row, col, Cell::Marked);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(dim: usize) -> Maze {
        let mut maze = Maze::new("striped", dim, Difficulty::Easy).unwrap();
        for row in 0..dim {
            for col in 0..dim {
                if (row + col) % 3 == 1 {
                    maze.set(row, col, Cell::Wall);
                }
            }
        }
        maze
    }

    #[test]
    fn test_new_maze_defaults() {
        let maze = Maze::new("fresh", 7, Difficulty::Medium).unwrap();
        assert_eq!(maze.dim(), 7);
        assert_eq!(maze.start(), (0, 0));
        assert_eq!(maze.end(), (6, 6));
        assert_eq!(maze.grid().count(Cell::Open), 49);
        assert!(maze.is_solvable());
    }

    #[test]
    fn test_dimension_floor() {
        assert_eq!(
            Maze::new("tiny", 4, Difficulty::Easy),
            Err(MazeError::InvalidDimension { dim: 4 })
        );
        let mut maze = Maze::new("ok", 5, Difficulty::Easy).unwrap();
        assert_eq!(maze.resize(3), Err(MazeError::InvalidDimension { dim: 3 }));
        assert_eq!(maze.dim(), 5);
    }

    #[test]
    fn test_shrink_keeps_top_left_block() {
        let original = striped(9);
        let mut maze = original.clone();
        maze.resize(6).unwrap();

        assert_eq!(maze.dim(), 6);
        for row in 0..6 {
            for col in 0..6 {
                if (row, col) == maze.start() || (row, col) == maze.end() {
                    continue;
                }
                assert_eq!(maze.get(row, col), original.get(row, col), "cell ({row}, {col})");
            }
        }
        assert_eq!(maze.start(), (0, 0));
        assert_eq!(maze.end(), (5, 5));
        assert_eq!(maze.get(5, 5), Cell::Open);
    }

    #[test]
    fn test_grow_keeps_cells_and_opens_new_area() {
        let original = striped(6);
        let mut maze = original.clone();
        maze.resize(10).unwrap();

        assert_eq!(maze.end(), (9, 9));
        for row in 0..10 {
            for col in 0..10 {
                let expected = if row < 6 && col < 6 {
                    original.get(row, col)
                } else {
                    Cell::Open
                };
                assert_eq!(maze.get(row, col), expected, "cell ({row}, {col})");
            }
        }
    }

    #[test]
    fn test_resize_forces_endpoints_open() {
        let mut maze = Maze::new("walls", 8, Difficulty::Hard).unwrap();
        maze.grid_mut().fill(Cell::Wall);
        maze.set(0, 0, Cell::Open);
        maze.set(7, 7, Cell::Open);
        maze.set_endpoints((6, 2), (7, 7));
        maze.set(6, 2, Cell::Open);

        maze.resize(5).unwrap();
        assert_eq!(maze.start(), (4, 2));
        assert_eq!(maze.end(), (4, 4));
        assert_eq!(maze.get(4, 2), Cell::Open);
        assert_eq!(maze.get(4, 4), Cell::Open);
        maze.validate().unwrap();
    }

    #[test]
    fn test_from_grid_rejects_walled_endpoint() {
        let grid = Grid::filled(5, Cell::Wall).unwrap();
        assert_eq!(
            Maze::from_grid("x", Difficulty::Easy, grid, (0, 0), (4, 4)),
            Err(MazeError::EndpointBlocked { row: 0, col: 0 })
        );
    }

    #[test]
    fn test_difficulty_parse_and_display() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.to_string().parse::<Difficulty>(), Ok(difficulty));
        }
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("1".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("brutal".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_difficulty_thresholds_are_monotonic() {
        let best: Vec<u16> = Difficulty::ALL.iter().map(|d| d.best_move_permille()).collect();
        let branch: Vec<u16> = Difficulty::ALL.iter().map(|d| d.branch_permille()).collect();
        assert!(best.windows(2).all(|w| w[0] > w[1]));
        assert!(branch.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_mark_path_skips_walls() {
        let mut maze = Maze::new("marks", 5, Difficulty::Easy).unwrap();
        maze.set(0, 1, Cell::Wall);
        maze.mark_path(&[(0, 0), (0, 1), (1, 1), (9, 9)]);
        assert_eq!(maze.get(0, 0), Cell::Marked);
        assert_eq!(maze.get(0, 1), Cell::Wall);
        assert_eq!(maze.get(1, 1), Cell::Marked);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let maze = striped(5);
        let json = serde_json::to_string(&maze).unwrap();
        let back: Maze = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();
        assert_eq!(back, maze);
    }

    #[test]
    fn test_validate_refuses_out_of_range_dimensions() {
        let json = |dim: usize| {
            format!(
                r#"{{"name":"big","difficulty":"easy","grid":{{"dim":{dim},"cells":[]}},"start":[0,0],"end":[4,4]}}"#
            )
        };
        for dim in [crate::MAX_DIM + 1, 1 << 33] {
            let maze: Maze = serde_json::from_str(&json(dim)).unwrap();
            assert_eq!(maze.validate(), Err(MazeError::InvalidDimension { dim }));
        }
        assert_eq!(
            Maze::new("big", crate::MAX_DIM + 1, Difficulty::Easy),
            Err(MazeError::InvalidDimension { dim: crate::MAX_DIM + 1 })
        );
    }
}
