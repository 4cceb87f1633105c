//! Per-session save files.
//!
//! Saves live at `saves/<session_id>/<sanitized_name>.json`, wrapping the
//! full state snapshot with metadata. Writes are whole-file via a temp file
//! and atomic rename; a second save under the same name disambiguates with
//! an ` (n)` suffix; a session holds at most five save files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use world_core::GameState;

/// Maximum save files per session.
pub const MAX_SAVES_PER_SESSION: usize = 5;
/// Maximum sanitized save-name length.
pub const MAX_SAVE_NAME_LEN: usize = 30;

/// Save/load failures, surfaced as stable string codes.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("no session id was supplied")]
    MissingSessionId,

    #[error("save name is empty after sanitization")]
    InvalidSaveName,

    #[error("game state payload is not usable")]
    InvalidGameState,

    #[error("session already holds {MAX_SAVES_PER_SESSION} saves")]
    SaveLimitExceeded,

    #[error("no save under that name")]
    SaveNotFound,

    #[error("save file is corrupt: {0}")]
    InvalidSaveFile(String),

    #[error("save failed: {0}")]
    SaveFailed(String),

    #[error("load failed: {0}")]
    LoadFailed(String),
}

impl SaveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSessionId => "MISSING_SESSION_ID",
            Self::InvalidSaveName => "INVALID_SAVE_NAME",
            Self::InvalidGameState => "INVALID_GAME_STATE",
            Self::SaveLimitExceeded => "SAVE_LIMIT_EXCEEDED",
            Self::SaveNotFound => "SAVE_NOT_FOUND",
            Self::InvalidSaveFile(_) => "INVALID_SAVE_FILE",
            Self::SaveFailed(_) => "SAVE_FAILED",
            Self::LoadFailed(_) => "LOAD_FAILED",
        }
    }
}

/// On-disk save envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveFile {
    #[serde(rename = "gameState")]
    pub game_state: GameState,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "saveName")]
    pub save_name: String,
}

/// Listing entry for one save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveInfo {
    pub name: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Strips anything outside `[A-Za-z0-9 ]`, trims, and caps the length.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_SAVE_NAME_LEN).collect())
}

/// File-backed save repository rooted at a base directory.
pub struct SaveRepository {
    base_dir: PathBuf,
}

impl SaveRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn session_dir(&self, session_id: &str) -> Result<PathBuf, SaveError> {
        if session_id.trim().is_empty() {
            return Err(SaveError::MissingSessionId);
        }
        Ok(self.base_dir.join(session_id))
    }

    fn existing_names(dir: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_suffix(".json"))
                    .map(str::to_string)
            })
            .collect()
    }

    /// Writes a save, returning the final (possibly suffixed) save name.
    pub fn save(
        &self,
        session_id: &str,
        raw_name: &str,
        state: &GameState,
        now: DateTime<Utc>,
    ) -> Result<String, SaveError> {
        let dir = self.session_dir(session_id)?;
        let name = sanitize_name(raw_name).ok_or(SaveError::InvalidSaveName)?;

        fs::create_dir_all(&dir).map_err(|e| SaveError::SaveFailed(e.to_string()))?;
        let existing = Self::existing_names(&dir);
        if existing.len() >= MAX_SAVES_PER_SESSION {
            return Err(SaveError::SaveLimitExceeded);
        }

        let mut final_name = name.clone();
        let mut counter = 1;
        while existing.contains(&final_name) {
            final_name = format!("{name} ({counter})");
            counter += 1;
        }

        let envelope = SaveFile {
            game_state: state.clone(),
            timestamp: now,
            session_id: session_id.to_string(),
            save_name: final_name.clone(),
        };
        let json = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| SaveError::SaveFailed(e.to_string()))?;

        let path = dir.join(format!("{final_name}.json"));
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, json).map_err(|e| SaveError::SaveFailed(e.to_string()))?;
        fs::rename(&temp, &path).map_err(|e| SaveError::SaveFailed(e.to_string()))?;

        debug!(session_id, save = %final_name, "wrote save file");
        Ok(final_name)
    }

    /// Loads a save by name.
    pub fn load(&self, session_id: &str, raw_name: &str) -> Result<SaveFile, SaveError> {
        let dir = self.session_dir(session_id)?;
        let name = sanitize_name(raw_name).ok_or(SaveError::InvalidSaveName)?;

        let path = dir.join(format!("{name}.json"));
        if !path.exists() {
            return Err(SaveError::SaveNotFound);
        }
        let bytes = fs::read(&path).map_err(|e| SaveError::LoadFailed(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SaveError::InvalidSaveFile(e.to_string()))
    }

    /// Lists a session's saves, newest first.
    pub fn list(&self, session_id: &str) -> Result<Vec<SaveInfo>, SaveError> {
        let dir = self.session_dir(session_id)?;
        let mut saves: Vec<SaveInfo> = Self::existing_names(&dir)
            .into_iter()
            .map(|name| {
                let timestamp = fs::read(dir.join(format!("{name}.json")))
                    .ok()
                    .and_then(|bytes| serde_json::from_slice::<SaveFile>(&bytes).ok())
                    .map(|file| file.timestamp);
                SaveInfo { name, timestamp }
            })
            .collect();
        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(saves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn sanitization_strips_and_caps() {
        assert_eq!(sanitize_name("  one!  "), Some("one".to_string()));
        assert_eq!(sanitize_name("../../etc/passwd"), Some("etcpasswd".to_string()));
        assert_eq!(sanitize_name("!!!"), None);
        let long = "a".repeat(60);
        assert_eq!(sanitize_name(&long).unwrap().len(), MAX_SAVE_NAME_LEN);
    }

    #[test]
    fn save_round_trips_state_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SaveRepository::new(dir.path());
        let state = GameState::new(42);

        repo.save("sess-1", "one", &state, now()).unwrap();
        let loaded = repo.load("sess-1", "one").unwrap();
        assert_eq!(loaded.game_state, state);
        assert_eq!(loaded.save_name, "one");
        assert_eq!(loaded.session_id, "sess-1");
    }

    #[test]
    fn same_name_gets_a_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SaveRepository::new(dir.path());
        let state = GameState::new(1);

        assert_eq!(repo.save("s", "one", &state, now()).unwrap(), "one");
        assert_eq!(repo.save("s", "one", &state, now()).unwrap(), "one (1)");
        assert_eq!(repo.save("s", "one", &state, now()).unwrap(), "one (2)");
    }

    #[test]
    fn sixth_save_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SaveRepository::new(dir.path());
        let state = GameState::new(1);

        for i in 0..MAX_SAVES_PER_SESSION {
            repo.save("s", &format!("slot {i}"), &state, now()).unwrap();
        }
        let err = repo.save("s", "overflow", &state, now()).unwrap_err();
        assert_eq!(err.code(), "SAVE_LIMIT_EXCEEDED");
    }

    #[test]
    fn missing_save_and_bad_file_have_distinct_codes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SaveRepository::new(dir.path());
        assert_eq!(
            repo.load("s", "ghost").unwrap_err().code(),
            "SAVE_NOT_FOUND"
        );

        std::fs::create_dir_all(dir.path().join("s")).unwrap();
        std::fs::write(dir.path().join("s/bad.json"), b"{not json").unwrap();
        assert_eq!(repo.load("s", "bad").unwrap_err().code(), "INVALID_SAVE_FILE");
    }

    #[test]
    fn sessions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SaveRepository::new(dir.path());
        let state = GameState::new(1);
        repo.save("alpha", "one", &state, now()).unwrap();
        assert_eq!(repo.load("beta", "one").unwrap_err().code(), "SAVE_NOT_FOUND");
        assert!(repo.list("beta").unwrap().is_empty());
    }
}
