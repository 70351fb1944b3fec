//! Grid maze engine: generation, validation and solving
//!
//! This crate owns everything that needs careful algorithmic design:
//! - [`grid`]: the square cell matrix
//! - [`maze`]: maze metadata, difficulty and resizing
//! - [`connectivity`]: which neighbours may be walked or carved
//! - [`router`]: one-shot and stepwise A* search
//! - [`generator`]: seeded corridor carving that always yields a solvable maze
//! - [`editor`]: single-cell edits for building and playing
//!
//! Persistence, rendering and input handling live in the host crate.

pub mod connectivity;
pub mod editor;
pub mod error;
pub mod generator;
pub mod grid;
pub mod maze;
pub mod rng;
pub mod router;

// Re-export commonly used types for convenience
pub use connectivity::Mode;
pub use editor::{Brush, Trace};
pub use error::MazeError;
pub use generator::{GenerationStats, Generator};
pub use grid::{Cell, Coord, Grid};
pub use maze::{Difficulty, Maze};
pub use rng::SimpleLCG;
pub use router::{RouteState, Step};

/// Smallest side length a maze may have.
pub const MIN_DIM: usize = 5;

/// Largest side length a maze may have.
pub const MAX_DIM: usize = 100;
