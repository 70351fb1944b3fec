//! Error type shared by every engine module.

use thiserror::Error;

/// Hard failures raised by the engine.
///
/// A maze that cannot be solved is not an error: the router reports that as
/// an ordinary `false` / [`crate::router::Step::Exhausted`] result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("maze dimension {dim} is outside {min}..={max}", min = crate::MIN_DIM, max = crate::MAX_DIM)]
    InvalidDimension { dim: usize },

    #[error("coordinate ({row}, {col}) lies outside a {dim}x{dim} grid")]
    OutOfBounds { row: usize, col: usize, dim: usize },

    #[error("grid rows must form a square, found {rows} rows with a row of length {cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("unknown cell code {code} (expected 0 = open, 1 = wall, 2 = marked)")]
    InvalidCellCode { code: u8 },

    #[error("endpoint ({row}, {col}) is a wall")]
    EndpointBlocked { row: usize, col: usize },

    #[error("route state was built for a {expected}x{expected} grid but stepped on {found}x{found}")]
    StateMismatch { expected: usize, found: usize },

    #[error("route state is inconsistent: {reason}")]
    CorruptState { reason: &'static str },

    #[error("maze generation gave up after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
}
