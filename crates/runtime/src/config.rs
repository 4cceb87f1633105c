//! Runtime configuration from the environment.

use std::path::PathBuf;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default save-file root, relative to the working directory.
pub const DEFAULT_SAVES_DIR: &str = "saves";

/// Service configuration resolved once at startup.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub port: u16,
    pub saves_dir: PathBuf,
}

impl RuntimeConfig {
    /// Reads `PORT` (default 3000) and `SAVES_DIR` (default `saves/`).
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let saves_dir = std::env::var("SAVES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SAVES_DIR));
        Self { port, saves_dir }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            saves_dir: PathBuf::from(DEFAULT_SAVES_DIR),
        }
    }
}
