//! Host-side services around the maze engine: the on-disk repository,
//! runtime configuration and terminal rendering.

pub mod config;
pub mod render;
pub mod repository;

pub use config::HostConfig;
pub use repository::{fingerprint, MazeRepository, RepositoryError, SaveMode};
