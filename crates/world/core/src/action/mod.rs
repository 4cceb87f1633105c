//! Action domain: normalized intents, validation, and application.
//!
//! The intent parser (an external collaborator) produces an [`Intent`]
//! holding a primary [`Action`] plus optional secondaries. Validation
//! checks the whole queue against current state without mutating anything;
//! application then routes each action to the world, inventory, or quest
//! layer, emitting deltas as it goes.

mod apply;
mod score;
mod validate;

pub use apply::{ApplyOutcome, apply_action};
pub use score::{alias_score, levenshtein, resolve_inventory};
pub use validate::{present_npcs, validate_intent};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::quest::QuestError;

/// Canonical movement directions; short aliases canonicalize to the
/// lowercase long names.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    /// Canonicalizes a raw direction token, accepting single-letter
    /// aliases. Returns `None` for anything unrecognized.
    pub fn canonicalize(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "n" | "north" => Some(Self::North),
            "s" | "south" => Some(Self::South),
            "e" | "east" => Some(Self::East),
            "w" | "west" => Some(Self::West),
            "u" | "up" => Some(Self::Up),
            "d" | "down" => Some(Self::Down),
            _ => None,
        }
    }

    /// Grid offset for cardinal directions; vertical directions move
    /// between layers instead.
    pub fn offset(self) -> Option<(i32, i32)> {
        match self {
            Self::North => Some((0, -1)),
            Self::South => Some((0, 1)),
            Self::East => Some((1, 0)),
            Self::West => Some((-1, 0)),
            Self::Up | Self::Down => None,
        }
    }
}

/// Actions that always validate and never mutate state.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrivialKind {
    Sit,
    Stand,
    Wait,
    Listen,
    Look,
    Inventory,
    Help,
}

/// Actions acknowledged but not simulated.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShallowKind {
    Cast,
    Attack,
    Sneak,
}

/// Quest-facing action kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestActionKind {
    AcceptQuest,
    CompleteQuest,
    AskAboutQuest,
}

/// A normalized player action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Movement; `dir` is raw until validation canonicalizes it.
    Move { dir: String },
    Take { target: String },
    Drop { target: String },
    Examine { target: String },
    Talk { target: String },
    Quest {
        kind: QuestActionKind,
        #[serde(default)]
        quest_id: Option<String>,
        #[serde(default)]
        npc_id: Option<String>,
    },
    Trivial { kind: TrivialKind },
    Shallow { kind: ShallowKind },
    Unknown { raw: String },
    Noop,
}

impl Action {
    /// Short name used in history entries and summaries.
    pub fn name(&self) -> String {
        match self {
            Self::Move { dir } => format!("move {dir}"),
            Self::Take { target } => format!("take {target}"),
            Self::Drop { target } => format!("drop {target}"),
            Self::Examine { target } => format!("examine {target}"),
            Self::Talk { target } => format!("talk {target}"),
            Self::Quest { kind, .. } => kind.to_string(),
            Self::Trivial { kind } => kind.to_string(),
            Self::Shallow { kind } => kind.to_string(),
            Self::Unknown { raw } => format!("unknown ({raw})"),
            Self::Noop => "noop".to_string(),
        }
    }
}

/// A parsed intent: the primary action, secondaries when the utterance was
/// compound, and the parser's confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub primary: Action,
    #[serde(default)]
    pub secondary: Vec<Action>,
    #[serde(default)]
    pub compound: bool,
    pub confidence: f64,
}

impl Intent {
    /// An intent that does nothing, used when parsing yields nothing usable.
    pub fn noop() -> Self {
        Self {
            primary: Action::Noop,
            secondary: Vec::new(),
            compound: false,
            confidence: 1.0,
        }
    }
}

/// A validated queue entry; `note` carries shallow-allow or pass-through
/// annotations surfaced to the narrator.
#[derive(Clone, Debug, PartialEq)]
pub struct QueuedAction {
    pub action: Action,
    pub note: Option<String>,
}

/// Validation failures, surfaced as stable string codes with state
/// unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("no intent was produced")]
    NoIntent,

    #[error("intent has no primary action")]
    NoPrimaryAction,

    #[error("action was empty")]
    EmptyAction,

    #[error("{0:?} is not a direction")]
    InvalidDirection(String),

    #[error("no {0:?} here to take")]
    TargetNotFoundInCell(String),

    #[error("no {0:?} in the inventory")]
    TargetNotInInventory(String),

    #[error("{0:?} is not visible here")]
    TargetNotVisible(String),

    #[error("no one called {0:?} is present")]
    NpcNotPresent(String),

    #[error(transparent)]
    Quest(#[from] QuestError),
}

impl ActionError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoIntent => "NO_INTENT",
            Self::NoPrimaryAction => "NO_PRIMARY_ACTION",
            Self::EmptyAction => "EMPTY_ACTION",
            Self::InvalidDirection(_) => "INVALID_DIRECTION",
            Self::TargetNotFoundInCell(_) => "TARGET_NOT_FOUND_IN_CELL",
            Self::TargetNotInInventory(_) => "TARGET_NOT_IN_INVENTORY",
            Self::TargetNotVisible(_) => "TARGET_NOT_VISIBLE",
            Self::NpcNotPresent(_) => "NPC_NOT_PRESENT",
            Self::Quest(err) => err.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_canonicalize_from_aliases() {
        assert_eq!(Direction::canonicalize("n"), Some(Direction::North));
        assert_eq!(Direction::canonicalize(" NORTH "), Some(Direction::North));
        assert_eq!(Direction::canonicalize("u"), Some(Direction::Up));
        assert_eq!(Direction::canonicalize("northeast"), None);
        assert_eq!(Direction::North.to_string(), "north");
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            ActionError::InvalidDirection("sideways".into()).code(),
            "INVALID_DIRECTION"
        );
        assert_eq!(
            ActionError::Quest(QuestError::NoQuestId).code(),
            "NO_QUEST_ID"
        );
    }
}
