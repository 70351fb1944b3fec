//! Directory-backed store of saved mazes.
//!
//! Each maze lives in its own pretty-printed JSON file named after its
//! fingerprint key (`<key>.maze`). The repository keeps a name -> file index
//! built when it is opened; it is an explicit object handed to whoever needs
//! it, never a process-wide registry.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use maze_core::{Difficulty, Maze, MazeError};
use thiserror::Error;

/// File extension of stored and exported mazes.
pub const EXTENSION: &str = "maze";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid maze: {0}")]
    Maze(#[from] MazeError),

    #[error("No saved maze named '{0}'")]
    NotFound(String),

    #[error("A maze named '{0}' already exists")]
    NameTaken(String),

    #[error("Maze '{0}' is not solvable and was not saved")]
    Unsolvable(String),

    #[error("Key {key} for maze '{name}' is already used by maze '{existing}'")]
    KeyCollision {
        key: String,
        name: String,
        existing: String,
    },
}

/// How [`MazeRepository::save`] treats an existing maze of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Refuse if the name is already stored.
    New,
    /// Replace the stored maze of that name, discarding its old record.
    Overwrite,
}

/// Storage key for a maze.
///
/// FNV-1a over the undelimited concatenation of name, difficulty index,
/// dimension, `start.row * start.col` and `end.row * end.col`. Distinct
/// mazes can share a key; [`MazeRepository::save`] refuses to let one
/// silently replace another.
pub fn fingerprint(maze: &Maze) -> String {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let difficulty = match maze.difficulty {
        Difficulty::Easy => 0,
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
    };
    let (start, end) = (maze.start(), maze.end());
    let material = format!(
        "{}{}{}{}{}",
        maze.name,
        difficulty,
        maze.dim(),
        start.0 * start.1,
        end.0 * end.1
    );

    let hash = material
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME));
    format!("{:016x}", hash)
}

pub struct MazeRepository {
    root: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl MazeRepository {
    /// Open (creating if needed) the store at `root` and index its mazes.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let mut repository = Self {
            root,
            entries: BTreeMap::new(),
        };
        repository.refresh()?;
        tracing::info!(
            "Opened maze repository at {} ({} mazes)",
            repository.root.display(),
            repository.entries.len()
        );
        Ok(repository)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild the index from disk. Unreadable files are skipped with a warning.
    pub fn refresh(&mut self) -> Result<(), RepositoryError> {
        self.entries.clear();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            match read_maze(&path) {
                Ok(maze) => {
                    if let Some(previous) = self.entries.get(&maze.name) {
                        tracing::warn!(
                            "Maze '{}' stored twice ({} and {}), keeping the first",
                            maze.name,
                            previous.display(),
                            path.display()
                        );
                        continue;
                    }
                    self.entries.insert(maze.name, path);
                }
                Err(e) => tracing::warn!("Skipping unreadable maze file {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    /// Names of all stored mazes, sorted.
    pub fn list(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Persist `maze` and return its key.
    ///
    /// Mazes whose end cannot be reached from their start are refused.
    pub fn save(&mut self, maze: &Maze, mode: SaveMode) -> Result<String, RepositoryError> {
        maze.validate()?;
        if !maze.is_solvable() {
            return Err(RepositoryError::Unsolvable(maze.name.clone()));
        }
        if mode == SaveMode::New && self.contains(&maze.name) {
            return Err(RepositoryError::NameTaken(maze.name.clone()));
        }

        let key = fingerprint(maze);
        let path = self.path_for(&key);
        if let Some(existing) = self.owner_of(&path) {
            if existing != maze.name {
                tracing::warn!("Fingerprint collision on key {}: '{}' vs '{}'", key, maze.name, existing);
                return Err(RepositoryError::KeyCollision {
                    key,
                    name: maze.name.clone(),
                    existing: existing.to_string(),
                });
            }
        }

        write_maze(&path, maze)?;
        if let Some(old) = self.entries.insert(maze.name.clone(), path.clone()) {
            if old != path {
                fs::remove_file(&old)?;
            }
        }

        tracing::info!("Saved maze '{}' under key {}", maze.name, key);
        Ok(key)
    }

    pub fn load(&self, name: &str) -> Result<Maze, RepositoryError> {
        let path = self
            .entries
            .get(name)
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
        read_maze(path)
    }

    pub fn delete(&mut self, name: &str) -> Result<(), RepositoryError> {
        let path = self
            .entries
            .remove(name)
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
        fs::remove_file(&path)?;
        tracing::info!("Deleted maze '{}'", name);
        Ok(())
    }

    /// Copy a stored maze to a standalone file for sharing.
    pub fn export(&self, name: &str, dest: &Path) -> Result<(), RepositoryError> {
        let maze = self.load(name)?;
        write_maze(dest, &maze)?;
        tracing::info!("Exported maze '{}' to {}", name, dest.display());
        Ok(())
    }

    /// Add a shared maze file to the store as a new maze. Returns its name.
    pub fn import(&mut self, src: &Path) -> Result<String, RepositoryError> {
        let maze = read_maze(src)?;
        self.save(&maze, SaveMode::New)?;
        Ok(maze.name)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, EXTENSION))
    }

    fn owner_of(&self, path: &Path) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, stored)| stored.as_path() == path)
            .map(|(name, _)| name.as_str())
    }
}

fn read_maze(path: &Path) -> Result<Maze, RepositoryError> {
    let json = fs::read_to_string(path)?;
    let maze: Maze = serde_json::from_str(&json)?;
    maze.validate()?;
    Ok(maze)
}

fn write_maze(path: &Path, maze: &Maze) -> Result<(), RepositoryError> {
    let json = serde_json::to_string_pretty(maze)?;
    fs::write(path, json)?;
    Ok(())
}
