//! Environment-driven runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Directory holding saved mazes.
pub const STORE_DIR_VAR: &str = "MAZE_STORE_DIR";
/// Delay between animated search rounds, in milliseconds.
pub const TICK_MS_VAR: &str = "MAZE_TICK_MS";
/// Address the API server binds to.
pub const BIND_ADDR_VAR: &str = "MAZE_BIND_ADDR";

const DEFAULT_STORE_DIR: &str = "mazes";
const DEFAULT_TICK_MS: u64 = 60;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub store_dir: PathBuf,
    pub tick: Duration,
    pub bind_address: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            bind_address: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = get(STORE_DIR_VAR) {
            config.store_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(TICK_MS_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.tick = Duration::from_millis(ms),
                Err(_) => tracing::warn!(
                    "Ignoring {}='{}': expected milliseconds, using {}ms",
                    TICK_MS_VAR,
                    raw,
                    DEFAULT_TICK_MS
                ),
            }
        }
        if let Some(addr) = get(BIND_ADDR_VAR) {
            config.bind_address = addr;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::from_lookup(lookup(&[]));
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.tick, Duration::from_millis(60));
    }

    #[test]
    fn test_overrides() {
        let config = HostConfig::from_lookup(lookup(&[
            (STORE_DIR_VAR, "/tmp/mazes"),
            (TICK_MS_VAR, "15"),
            (BIND_ADDR_VAR, "127.0.0.1:9000"),
        ]));
        assert_eq!(config.store_dir, PathBuf::from("/tmp/mazes"));
        assert_eq!(config.tick, Duration::from_millis(15));
        assert_eq!(config.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_bad_tick_keeps_default() {
        let config = HostConfig::from_lookup(lookup(&[(TICK_MS_VAR, "soon"), (STORE_DIR_VAR, "  ")]));
        assert_eq!(config.tick, Duration::from_millis(60));
        assert_eq!(config.store_dir, PathBuf::from("mazes"));
    }
}
