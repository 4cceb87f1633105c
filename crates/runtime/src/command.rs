//! System-command detection in raw player text.
//!
//! Save/load/new-game/list-saves requests short-circuit the narrator and
//! return a `systemCommand` response instead of running a turn.

use std::sync::LazyLock;

use regex::Regex;

static SAVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^save(?:\s+as)?\s+(.+)$").unwrap());
static LOAD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^load\s+(.+)$").unwrap());
static NEW_GAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:new game|restart|start over)$").unwrap());
static LIST_SAVES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:saves|my saves|list saves|show saves)$").unwrap());

/// A recognized out-of-band command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemCommand {
    Save { name: String },
    Load { name: String },
    NewGame,
    ListSaves,
}

/// Detects a system command in the raw utterance.
pub fn detect(text: &str) -> Option<SystemCommand> {
    let trimmed = text.trim();
    if let Some(caps) = SAVE_RE.captures(trimmed) {
        return Some(SystemCommand::Save {
            name: caps[1].trim().to_string(),
        });
    }
    if let Some(caps) = LOAD_RE.captures(trimmed) {
        return Some(SystemCommand::Load {
            name: caps[1].trim().to_string(),
        });
    }
    if NEW_GAME_RE.is_match(trimmed) {
        return Some(SystemCommand::NewGame);
    }
    if LIST_SAVES_RE.is_match(trimmed) {
        return Some(SystemCommand::ListSaves);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_variants_are_detected() {
        assert_eq!(
            detect("save my camp"),
            Some(SystemCommand::Save { name: "my camp".into() })
        );
        assert_eq!(
            detect("Save as before the bridge"),
            Some(SystemCommand::Save { name: "before the bridge".into() })
        );
    }

    #[test]
    fn load_new_game_and_listings_are_detected() {
        assert_eq!(detect("load one"), Some(SystemCommand::Load { name: "one".into() }));
        assert_eq!(detect("START OVER"), Some(SystemCommand::NewGame));
        assert_eq!(detect("restart"), Some(SystemCommand::NewGame));
        assert_eq!(detect("my saves"), Some(SystemCommand::ListSaves));
        assert_eq!(detect("show saves"), Some(SystemCommand::ListSaves));
    }

    #[test]
    fn ordinary_text_is_not_a_command() {
        assert_eq!(detect("go north"), None);
        assert_eq!(detect("saves the day"), None);
        assert_eq!(detect("loading dock"), None);
    }
}
