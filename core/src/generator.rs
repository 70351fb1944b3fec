//! Maze generation by randomized corridor carving
//!
//! 1. Fill the grid with walls and open `start`.
//! 2. Carve a root path toward `end`, one carve-eligible neighbour at a time:
//!    - rank candidates by straight-line distance to `end`
//!    - take the closest with a difficulty-dependent probability, otherwise
//!      a uniform pick among the rest
//!    - on a dead end, pop and re-wall path cells until the router (carve
//!      mode) says `end` is reachable again, then resume with a candidate the
//!      router confirms
//! 3. Grow dead-end branches off every carved cell, at most one per cell.
//!
//! Carve mode never lets a new cell touch a corridor other than its parent,
//! so the open cells always form a tree: exactly one route between any two
//! cells, and corridors one cell wide.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::connectivity::{self, Mode};
use crate::error::MazeError;
use crate::grid::{euclidean, Cell, Coord, Grid};
use crate::maze::Maze;
use crate::router;
use crate::rng::SimpleLCG;

/// Attempts before [`Generator::generate`] reports exhaustion.
pub const MAX_ATTEMPTS: u32 = 16;

/// Cells popped per attempt is capped at `dim * dim * BACKTRACK_FACTOR`.
const BACKTRACK_FACTOR: usize = 4;

/// Summary of a successful generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub seed: u32,
    /// Cells on the carved route from `start` to `end`, both included.
    pub root_path_len: usize,
    /// Cells opened while growing dead ends.
    pub branch_cells: usize,
    /// Path cells re-walled while backtracking, summed over attempts.
    pub backtracks: usize,
    pub attempts: u32,
}

/// Seeded maze generator.
pub struct Generator {
    seed: u32,
    rng: SimpleLCG,
    max_attempts: u32,
    backtrack_factor: usize,
}

impl Generator {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            rng: SimpleLCG::new(seed),
            max_attempts: MAX_ATTEMPTS,
            backtrack_factor: BACKTRACK_FACTOR,
        }
    }

    /// Override the retry and backtracking caps.
    pub(crate) fn with_limits(mut self, max_attempts: u32, backtrack_factor: usize) -> Self {
        self.max_attempts = max_attempts;
        self.backtrack_factor = backtrack_factor;
        self
    }

    /// Rewrite `maze` into a solvable layout.
    ///
    /// Keeps `start`, `end`, `dim` and `difficulty`; every cell is rewritten.
    /// If every attempt dead-ends the grid is left fully walled apart from
    /// the endpoints and [`MazeError::GenerationExhausted`] is returned.
    /// With the default caps this is rare: the carve-mode reachability check
    /// usually finds a resumption cell well within the backtracking budget.
    pub fn generate(&mut self, maze: &mut Maze) -> Result<GenerationStats, MazeError> {
        let (start, end) = (maze.start(), maze.end());
        let difficulty = maze.difficulty;
        let dim = maze.dim();
        let mut backtracks = 0;

        for attempt in 1..=self.max_attempts {
            let grid = maze.grid_mut();
            let Some(root) = self.attempt(grid, start, end, difficulty.best_move_permille(), &mut backtracks)
            else {
                tracing::warn!(
                    "Generation attempt {}/{} for maze '{}' dead-ended, retrying",
                    attempt,
                    self.max_attempts,
                    maze.name
                );
                continue;
            };

            let branch_cells = self.grow_branches(grid, root.iter().copied(), difficulty.branch_permille());
            let stats = GenerationStats {
                seed: self.seed,
                root_path_len: root.len(),
                branch_cells,
                backtracks,
                attempts: attempt,
            };
            tracing::info!(
                "Generated {}x{} {} maze '{}' (seed {}, root path {}, branches {}, backtracks {})",
                dim,
                dim,
                difficulty,
                maze.name,
                self.seed,
                stats.root_path_len,
                stats.branch_cells,
                stats.backtracks
            );
            return Ok(stats);
        }

        let grid = maze.grid_mut();
        grid.fill(Cell::Wall);
        grid.set(start.0, start.1, Cell::Open);
        grid.set(end.0, end.1, Cell::Open);
        tracing::warn!("Gave up generating maze '{}' after {} attempts", maze.name, self.max_attempts);
        Err(MazeError::GenerationExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Carve the root path. Returns it from `start` to `end`, or `None` once
    /// the backtracking budget is spent or the start itself is boxed in.
    fn attempt(
        &mut self,
        grid: &mut Grid,
        start: Coord,
        end: Coord,
        best_move_permille: u16,
        backtracks: &mut usize,
    ) -> Option<Vec<Coord>> {
        grid.fill(Cell::Wall);
        grid.set(start.0, start.1, Cell::Open);

        let budget = grid.dim() * grid.dim() * self.backtrack_factor;
        let mut popped = 0;
        let mut path = vec![start];
        let mut resuming = false;

        while let Some(&head) = path.last() {
            if head == end {
                break;
            }

            let mut candidates: Vec<Coord> = connectivity::neighbors(grid, head, Mode::Carve).iter().collect();
            if resuming {
                let feasible: Vec<Coord> = candidates
                    .iter()
                    .copied()
                    .filter(|&candidate| reaches_end_through(grid, candidate, end))
                    .collect();
                if !feasible.is_empty() {
                    candidates = feasible;
                }
                resuming = false;
            }

            if candidates.is_empty() {
                loop {
                    if path.len() == 1 || popped >= budget {
                        return None;
                    }
                    if let Some((row, col)) = path.pop() {
                        grid.set(row, col, Cell::Wall);
                    }
                    popped += 1;
                    *backtracks += 1;

                    let Some(&resume) = path.last() else {
                        return None;
                    };
                    if router::route(grid, resume, end, Mode::Carve).unwrap_or(false) {
                        tracing::debug!("Backtracked to {:?} after {} pops", resume, popped);
                        break;
                    }
                }
                resuming = true;
                continue;
            }

            let next = self.choose(candidates, end, best_move_permille);
            grid.set(next.0, next.1, Cell::Open);
            path.push(next);
        }

        Some(path)
    }

    /// Pick the next root path cell among carve candidates.
    fn choose(&mut self, mut candidates: Vec<Coord>, end: Coord, best_move_permille: u16) -> Coord {
        if candidates.contains(&end) {
            return end;
        }

        candidates.sort_by(|a, b| euclidean(*a, end).total_cmp(&euclidean(*b, end)).then(a.cmp(b)));

        if candidates.len() == 1 || self.rng.chance(best_move_permille) {
            candidates[0]
        } else {
            candidates[1 + self.rng.choice_index(candidates.len() - 1)]
        }
    }

    /// Open decorative dead ends. Every carved cell (root path first, then
    /// each new branch cell) gets at most one new neighbour.
    fn grow_branches(
        &mut self,
        grid: &mut Grid,
        root: impl IntoIterator<Item = Coord>,
        branch_permille: u16,
    ) -> usize {
        let mut queue: VecDeque<Coord> = root.into_iter().collect();

        let mut opened = 0;
        while let Some(cell) = queue.pop_front() {
            let candidates = connectivity::neighbors(grid, cell, Mode::Carve);
            if candidates.is_empty() || !self.rng.chance(branch_permille) {
                continue;
            }
            let pick = candidates.as_slice()[self.rng.choice_index(candidates.len())];
            grid.set(pick.0, pick.1, Cell::Open);
            queue.push_back(pick);
            opened += 1;
        }
        opened
    }
}

/// Whether carving `candidate` still leaves `end` reachable through carve-eligible cells.
fn reaches_end_through(grid: &mut Grid, candidate: Coord, end: Coord) -> bool {
    if candidate == end {
        return true;
    }
    grid.set(candidate.0, candidate.1, Cell::Open);
    let reachable = router::route(grid, candidate, end, Mode::Carve).unwrap_or(false);
    grid.set(candidate.0, candidate.1, Cell::Wall);
    reachable
}
