//! A* router over a [`Grid`].
//!
//! The search runs either to completion ([`route`], [`find_path`]) or one
//! node expansion at a time ([`step`]) against a caller-owned
//! [`RouteState`]. The router never writes to the grid; a driver that wants
//! to display progress reads `current` / `path` from the returned [`Step`].
//!
//! All moves cost 1. The heuristic is straight-line distance, admissible on
//! a 4-connected grid though looser than Manhattan distance.
//! Among frontier entries with equal f-score the lowest `(row, col)` wins.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::connectivity::{self, Mode};
use crate::error::MazeError;
use crate::grid::{euclidean, Coord, Grid};

/// Resumable A* working state.
///
/// Score tables are dense and indexed `row * dim + col`, which keeps the
/// state plain data that serialises to JSON between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteState {
    src: Coord,
    dest: Coord,
    mode: Mode,
    dim: usize,
    frontier: BTreeSet<Coord>,
    came_from: Vec<Option<Coord>>,
    g_score: Vec<Option<u32>>,
    f_score: Vec<Option<f64>>,
    rounds: u32,
}

/// Outcome of one expansion round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Step {
    /// `current` was expanded; the search is still running.
    Expanded { current: Coord },
    /// `dest` was selected. `path` runs from `src` to `dest` inclusive.
    Reached { path: Vec<Coord> },
    /// The frontier is empty: no route exists under the active mode.
    Exhausted,
}

impl Step {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Step::Expanded { .. })
    }
}

impl RouteState {
    /// Fresh search state seeded with `src`.
    pub fn new(grid: &Grid, src: Coord, dest: Coord, mode: Mode) -> Result<Self, MazeError> {
        grid.check_bounds(src)?;
        grid.check_bounds(dest)?;

        let dim = grid.dim();
        let cells = dim * dim;
        let mut state = Self {
            src,
            dest,
            mode,
            dim,
            frontier: BTreeSet::from([src]),
            came_from: vec![None; cells],
            g_score: vec![None; cells],
            f_score: vec![None; cells],
            rounds: 0,
        };
        let idx = state.index(src);
        state.g_score[idx] = Some(0);
        state.f_score[idx] = Some(euclidean(src, dest));
        Ok(state)
    }

    pub fn src(&self) -> Coord {
        self.src
    }

    pub fn dest(&self) -> Coord {
        self.dest
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of rounds performed so far.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn frontier(&self) -> &BTreeSet<Coord> {
        &self.frontier
    }

    pub fn g_score(&self, at: Coord) -> Option<u32> {
        self.slot(at).and_then(|idx| self.g_score[idx])
    }

    /// Best known path from `src` to `at`, empty if `at` has not been reached.
    ///
    /// The walk back is capped at one hop per cell, so even a state that was
    /// never checked against a grid cannot loop.
    pub fn path_to(&self, at: Coord) -> Vec<Coord> {
        if self.g_score(at).is_none() {
            return Vec::new();
        }
        let mut path = vec![at];
        let mut cursor = at;
        while let Some(prev) = self.slot(cursor).and_then(|idx| self.came_from.get(idx).copied().flatten()) {
            if path.len() > self.came_from.len() {
                break;
            }
            path.push(prev);
            cursor = prev;
        }
        path.reverse();
        path
    }

    fn index(&self, (row, col): Coord) -> usize {
        row * self.dim + col
    }

    fn slot(&self, at: Coord) -> Option<usize> {
        (at.0 < self.dim && at.1 < self.dim).then(|| self.index(at))
    }

    /// Frontier member with the lowest f-score, ties broken by coordinate.
    fn lowest_f(&self) -> Option<Coord> {
        let f = |at: &Coord| self.f_score[self.index(*at)].unwrap_or(f64::INFINITY);
        self.frontier
            .iter()
            .copied()
            .min_by(|a, b| f(a).total_cmp(&f(b)).then(a.cmp(b)))
    }

    /// A state deserialised from outside must still describe `grid`.
    ///
    /// Beyond shape and bounds, every predecessor link must point to a cell
    /// with a strictly lower g-score. A* only ever records links that way,
    /// and it rules out cycles in `came_from`.
    fn check_grid(&self, grid: &Grid) -> Result<(), MazeError> {
        if grid.dim() != self.dim {
            return Err(MazeError::StateMismatch {
                expected: self.dim,
                found: grid.dim(),
            });
        }
        let cells = self.dim.checked_mul(self.dim).ok_or(MazeError::CorruptState {
            reason: "dimension overflows",
        })?;
        if self.came_from.len() != cells || self.g_score.len() != cells || self.f_score.len() != cells {
            return Err(MazeError::CorruptState {
                reason: "score tables do not match the grid",
            });
        }
        grid.check_bounds(self.src)?;
        grid.check_bounds(self.dest)?;
        for &at in &self.frontier {
            grid.check_bounds(at)?;
        }

        let max_cost = u32::try_from(cells).unwrap_or(u32::MAX);
        for (idx, prev) in self.came_from.iter().enumerate() {
            let g = self.g_score[idx];
            if g.is_some_and(|g| g > max_cost) {
                return Err(MazeError::CorruptState {
                    reason: "g-score exceeds the number of cells",
                });
            }
            let Some(prev) = *prev else {
                continue;
            };
            grid.check_bounds(prev)?;
            match (g, self.g_score[self.index(prev)]) {
                (Some(g), Some(prev_g)) if prev_g < g => {}
                _ => {
                    return Err(MazeError::CorruptState {
                        reason: "predecessor links do not descend to the source",
                    })
                }
            }
        }
        Ok(())
    }
}

/// Perform exactly one expansion round on `state`.
///
/// `state` may come from anywhere (a deserialised request, say), so it is
/// checked against `grid` before anything is indexed.
/// Calling again after [`Step::Exhausted`] keeps returning `Exhausted`;
/// calling again after [`Step::Reached`] reports the same path.
pub fn step(grid: &Grid, state: &mut RouteState) -> Result<Step, MazeError> {
    state.check_grid(grid)?;
    expand(grid, state)
}

/// One round on a state known to fit `grid`.
fn expand(grid: &Grid, state: &mut RouteState) -> Result<Step, MazeError> {
    let Some(current) = state.lowest_f() else {
        return Ok(Step::Exhausted);
    };
    state.rounds = state.rounds.saturating_add(1);

    if current == state.dest {
        return Ok(Step::Reached {
            path: state.path_to(current),
        });
    }

    state.frontier.remove(&current);
    let tentative = state
        .g_score(current)
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(MazeError::CorruptState {
            reason: "g-score overflow",
        })?;

    for neighbor in connectivity::neighbors(grid, current, state.mode).iter() {
        let idx = state.index(neighbor);
        if state.g_score[idx].map_or(true, |known| tentative < known) {
            state.came_from[idx] = Some(current);
            state.g_score[idx] = Some(tentative);
            state.f_score[idx] = Some(tentative as f64 + euclidean(neighbor, state.dest));
            state.frontier.insert(neighbor);
        }
    }

    Ok(Step::Expanded { current })
}

/// Run a search to completion and return its final step.
fn run(grid: &Grid, src: Coord, dest: Coord, mode: Mode) -> Result<Step, MazeError> {
    let mut state = RouteState::new(grid, src, dest, mode)?;
    loop {
        let outcome = expand(grid, &mut state)?;
        if outcome.is_finished() {
            tracing::trace!(
                "Route {:?} -> {:?} ({:?}) finished after {} rounds: {}",
                src,
                dest,
                mode,
                state.rounds,
                matches!(outcome, Step::Reached { .. })
            );
            return Ok(outcome);
        }
    }
}

/// One-shot solvability query: can `dest` be reached from `src` under `mode`?
///
/// `Ok(false)` is an ordinary answer. Errors only signal coordinates outside the grid.
pub fn route(grid: &Grid, src: Coord, dest: Coord, mode: Mode) -> Result<bool, MazeError> {
    Ok(matches!(run(grid, src, dest, mode)?, Step::Reached { .. }))
}

/// Shortest path from `src` to `dest` under `mode`, both ends included.
pub fn find_path(
    grid: &Grid,
    src: Coord,
    dest: Coord,
    mode: Mode,
) -> Result<Option<Vec<Coord>>, MazeError> {
    match run(grid, src, dest, mode)? {
        Step::Reached { path } => Ok(Some(path)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    fn fixture() -> Grid {
        Grid::from_rows(&[
            [0u8, 1, 0, 0, 0],
            [1, 1, 0, 1, 0],
            [0, 1, 0, 1, 0],
            [0, 1, 0, 1, 0],
            [0, 0, 0, 1, 0],
        ])
        .unwrap()
    }

    fn run_stepwise(grid: &Grid, src: Coord, dest: Coord, mode: Mode) -> Step {
        let mut state = RouteState::new(grid, src, dest, mode).unwrap();
        loop {
            let outcome = step(grid, &mut state).unwrap();
            if outcome.is_finished() {
                return outcome;
            }
        }
    }

    #[test]
    fn test_enclosed_start_is_unreachable() {
        let grid = fixture();
        assert!(!route(&grid, (0, 0), (4, 4), Mode::Corridor).unwrap());
        assert!(route(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap());
    }

    #[test]
    fn test_carve_mode_routes_through_eligible_walls() {
        let grid = Grid::from_rows(&[
            [0u8, 0, 0, 1, 1],
            [1, 1, 0, 1, 1],
            [1, 1, 0, 1, 1],
            [1, 1, 0, 1, 1],
            [1, 1, 1, 1, 1],
        ])
        .unwrap();
        assert!(route(&grid, (3, 2), (4, 4), Mode::Carve).unwrap());
    }

    #[test]
    fn test_carve_mode_detects_a_boxed_in_corridor() {
        // The corridor turned back on itself at (3, 1); every way out
        // from there would touch the existing corridor.
        let grid = Grid::from_rows(&[
            [0u8, 0, 0, 1, 1],
            [1, 1, 0, 1, 1],
            [1, 1, 0, 1, 1],
            [1, 0, 0, 1, 1],
            [1, 1, 1, 1, 1],
        ])
        .unwrap();
        assert!(!route(&grid, (3, 1), (4, 4), Mode::Carve).unwrap());
    }

    #[test]
    fn test_stepwise_matches_one_shot() {
        let grid = fixture();
        let cases = [((0, 0), (4, 4)), ((3, 0), (4, 4)), ((4, 4), (0, 2)), ((2, 0), (2, 0))];
        for (src, dest) in cases {
            let one_shot = route(&grid, src, dest, Mode::Corridor).unwrap();
            let stepped = run_stepwise(&grid, src, dest, Mode::Corridor);
            assert_eq!(
                one_shot,
                matches!(stepped, Step::Reached { .. }),
                "{src:?} -> {dest:?}"
            );
        }
    }

    #[test]
    fn test_path_is_shortest_and_contiguous() {
        let grid = Grid::new(5).unwrap();
        let path = find_path(&grid, (0, 0), (4, 4), Mode::Corridor).unwrap().unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(4, 4)));
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!(a.0.abs_diff(b.0) + a.1.abs_diff(b.1), 1);
        }
    }

    #[test]
    fn test_fixture_path_follows_the_corridor() {
        let grid = fixture();
        let path = find_path(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap().unwrap();
        assert_eq!(path.len(), 14);
        assert!(path.iter().all(|&at| grid.is_walkable(at)));
    }

    #[test]
    fn test_source_equals_destination() {
        let grid = fixture();
        let mut state = RouteState::new(&grid, (2, 2), (2, 2), Mode::Corridor).unwrap();
        assert_eq!(
            step(&grid, &mut state).unwrap(),
            Step::Reached { path: vec![(2, 2)] }
        );
    }

    #[test]
    fn test_exhausted_is_sticky() {
        let grid = fixture();
        let mut state = RouteState::new(&grid, (0, 0), (4, 4), Mode::Corridor).unwrap();
        assert_eq!(step(&grid, &mut state).unwrap(), Step::Expanded { current: (0, 0) });
        assert_eq!(step(&grid, &mut state).unwrap(), Step::Exhausted);
        assert_eq!(step(&grid, &mut state).unwrap(), Step::Exhausted);
        assert_eq!(state.rounds(), 1);
    }

    #[test]
    fn test_router_leaves_grid_untouched() {
        let grid = fixture();
        let before = grid.clone();
        route(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap();
        run_stepwise(&grid, (3, 0), (4, 4), Mode::Corridor);
        assert_eq!(grid, before);
        assert_eq!(grid.count(Cell::Marked), 0);
    }

    #[test]
    fn test_state_survives_serialisation_between_ticks() {
        let grid = fixture();
        let mut state = RouteState::new(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap();
        for _ in 0..4 {
            assert!(!step(&grid, &mut state).unwrap().is_finished());
        }

        let json = serde_json::to_string(&state).unwrap();
        let mut restored: RouteState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);

        let direct = loop {
            let outcome = step(&grid, &mut state).unwrap();
            if outcome.is_finished() {
                break outcome;
            }
        };
        let resumed = loop {
            let outcome = step(&grid, &mut restored).unwrap();
            if outcome.is_finished() {
                break outcome;
            }
        };
        assert_eq!(direct, resumed);
    }

    #[test]
    fn test_out_of_bounds_endpoints_are_rejected() {
        let grid = fixture();
        assert_eq!(
            route(&grid, (0, 0), (5, 1), Mode::Corridor),
            Err(MazeError::OutOfBounds { row: 5, col: 1, dim: 5 })
        );
    }

    #[test]
    fn test_state_refuses_a_different_grid() {
        let grid = fixture();
        let mut state = RouteState::new(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap();
        let bigger = Grid::new(6).unwrap();
        assert_eq!(
            step(&bigger, &mut state),
            Err(MazeError::StateMismatch { expected: 5, found: 6 })
        );
    }

    fn tampered(state: &RouteState, edit: impl FnOnce(&mut serde_json::Value)) -> RouteState {
        let mut value = serde_json::to_value(state).unwrap();
        edit(&mut value);
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tampered_state_is_refused() {
        let grid = fixture();
        let state = RouteState::new(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap();

        let mut truncated = tampered(&state, |v| v["g_score"] = serde_json::json!([0]));
        assert_eq!(
            step(&grid, &mut truncated),
            Err(MazeError::CorruptState {
                reason: "score tables do not match the grid"
            })
        );

        let mut stray = tampered(&state, |v| v["frontier"] = serde_json::json!([[9, 9]]));
        assert_eq!(
            step(&grid, &mut stray),
            Err(MazeError::OutOfBounds { row: 9, col: 9, dim: 5 })
        );

        let mut huge = tampered(&state, |v| v["dim"] = serde_json::json!(1u64 << 33));
        assert_eq!(
            step(&grid, &mut huge),
            Err(MazeError::StateMismatch {
                expected: 1 << 33,
                found: 5
            })
        );

        // src sits at index 3 * 5 + 0
        let mut costly = tampered(&state, |v| v["g_score"][15] = serde_json::json!(u32::MAX));
        assert_eq!(
            step(&grid, &mut costly),
            Err(MazeError::CorruptState {
                reason: "g-score exceeds the number of cells"
            })
        );
    }

    #[test]
    fn test_predecessor_cycle_is_refused() {
        let grid = fixture();
        let state = RouteState::new(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap();

        // (0, 1) names itself as its own predecessor
        let mut cyclic = tampered(&state, |v| {
            v["came_from"][1] = serde_json::json!([0, 1]);
            v["g_score"][1] = serde_json::json!(1);
            v["frontier"] = serde_json::json!([[0, 1]]);
        });
        assert!(cyclic.path_to((0, 1)).len() <= 26);
        assert_eq!(
            step(&grid, &mut cyclic),
            Err(MazeError::CorruptState {
                reason: "predecessor links do not descend to the source"
            })
        );
    }

    #[test]
    fn test_round_counter_saturates() {
        let grid = fixture();
        let state = RouteState::new(&grid, (3, 0), (4, 4), Mode::Corridor).unwrap();
        let mut worn = tampered(&state, |v| v["rounds"] = serde_json::json!(u32::MAX));
        assert_eq!(step(&grid, &mut worn).unwrap(), Step::Expanded { current: (3, 0) });
        assert_eq!(worn.rounds(), u32::MAX);
    }
}
