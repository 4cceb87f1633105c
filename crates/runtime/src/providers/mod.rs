//! Provider ports for the external language-model collaborators.
//!
//! The simulation core never talks to a network; these traits isolate the
//! three LLM touchpoints — intent parsing, scene narration, and quest
//! narrative generation — behind async seams with caching, timeouts, and
//! deterministic fallbacks. A missing API key degrades every path without
//! error.

mod cache;
mod deepseek;
mod fallback;

pub use cache::ParseCache;
pub use deepseek::DeepSeekClient;
pub use fallback::{FallbackNarrator, LegacyParser};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use world_core::{Action, Intent, QuestActionKind, ShallowKind, TrivialKind};

/// Timeout for intent-parser calls.
pub const PARSER_TIMEOUT_SECS: u64 = 15;
/// Timeout for quest-narrative calls.
pub const NARRATIVE_TIMEOUT_SECS: u64 = 30;
/// Retry attempts for quest-narrative calls.
pub const NARRATIVE_MAX_ATTEMPTS: u32 = 3;
/// Minimum confidence below which a parse falls back to the legacy parser.
pub const CONFIDENCE_FLOOR: f64 = 0.5;

/// Compact game context handed to the parser (and folded into the cache
/// key).
#[derive(Clone, Debug, Default, Serialize)]
pub struct GameContext {
    pub layer: u8,
    pub location: String,
    pub biome: Option<String>,
    pub visible_items: Vec<String>,
    pub present_npcs: Vec<String>,
}

/// Parser failures, surfaced as stable string codes.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParserError {
    #[error("input was empty")]
    EmptyInput,

    #[error("no API key is configured")]
    NoApiKey,

    #[error("language model unavailable: {0}")]
    LlmUnavailable(String),

    #[error("reply could not be parsed: {0}")]
    ParseFailed(String),

    #[error("confidence {0} below floor")]
    LowConfidence(f64),
}

impl ParserError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::NoApiKey => "NO_API_KEY",
            Self::LlmUnavailable(_) => "LLM_UNAVAILABLE",
            Self::ParseFailed(_) => "PARSE_FAILED",
            Self::LowConfidence(_) => "LOW_CONFIDENCE",
        }
    }
}

/// Narration failures; always degraded to a fallback, never surfaced as a
/// turn error.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum NarrationError {
    #[error("no API key is configured")]
    NoApiKey,

    #[error("language model unavailable: {0}")]
    LlmUnavailable(String),

    #[error("reply was not usable: {0}")]
    BadReply(String),
}

/// Normalizes raw player text into a structured [`Intent`].
#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn normalize(&self, text: &str, ctx: &GameContext) -> Result<Intent, ParserError>;
}

/// Renders a scene payload into prose.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, scene: &Value) -> Result<String, NarrationError>;
}

/// Proposes narrative JSON for a rolled quest; the reply is validated by
/// the quest engine before it is trusted.
#[async_trait]
pub trait QuestNarrativeProvider: Send + Sync {
    async fn generate(&self, request: &Value) -> Result<Value, NarrationError>;
}

/// Converts a parser reply of the wire shape
/// `{primaryAction: {action, target?, dir?}, secondaryActions?, compound,
/// confidence}` into an [`Intent`].
pub fn intent_from_reply(reply: &Value) -> Result<Intent, ParserError> {
    let primary = reply
        .get("primaryAction")
        .ok_or_else(|| ParserError::ParseFailed("no primary action".to_string()))?;
    let confidence = reply
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let secondary = reply
        .get("secondaryActions")
        .and_then(Value::as_array)
        .map(|list| list.iter().map(action_from_value).collect())
        .unwrap_or_default();

    Ok(Intent {
        primary: action_from_value(primary),
        secondary,
        compound: reply.get("compound").and_then(Value::as_bool).unwrap_or(false),
        confidence,
    })
}

fn action_from_value(value: &Value) -> Action {
    let name = value
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_lowercase();
    let target = value
        .get("target")
        .and_then(Value::as_str)
        .map(str::to_string);
    let dir = value.get("dir").and_then(Value::as_str).map(str::to_string);

    match name.as_str() {
        "move" | "go" | "walk" => Action::Move {
            dir: dir.or(target).unwrap_or_default(),
        },
        "take" | "pick_up" | "grab" => Action::Take {
            target: target.unwrap_or_default(),
        },
        "drop" => Action::Drop {
            target: target.unwrap_or_default(),
        },
        "examine" | "inspect" => Action::Examine {
            target: target.unwrap_or_default(),
        },
        "talk" | "speak" => Action::Talk {
            target: target.unwrap_or_default(),
        },
        "accept_quest" => Action::Quest {
            kind: QuestActionKind::AcceptQuest,
            quest_id: target,
            npc_id: None,
        },
        "complete_quest" => Action::Quest {
            kind: QuestActionKind::CompleteQuest,
            quest_id: target,
            npc_id: value
                .get("npc_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "ask_about_quest" => Action::Quest {
            kind: QuestActionKind::AskAboutQuest,
            quest_id: None,
            npc_id: target,
        },
        "" => Action::Noop,
        other => {
            if let Ok(kind) = other.parse::<TrivialKind>() {
                Action::Trivial { kind }
            } else if let Ok(kind) = other.parse::<ShallowKind>() {
                Action::Shallow { kind }
            } else {
                Action::Unknown {
                    raw: other.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_maps_to_move_intent() {
        let reply = json!({
            "primaryAction": { "action": "move", "dir": "north" },
            "compound": false,
            "confidence": 0.92,
        });
        let intent = intent_from_reply(&reply).unwrap();
        assert_eq!(intent.primary, Action::Move { dir: "north".into() });
        assert!(intent.secondary.is_empty());
        assert_eq!(intent.confidence, 0.92);
    }

    #[test]
    fn compound_reply_keeps_secondaries() {
        let reply = json!({
            "primaryAction": { "action": "take", "target": "dagger" },
            "secondaryActions": [{ "action": "look" }],
            "compound": true,
            "confidence": 0.8,
        });
        let intent = intent_from_reply(&reply).unwrap();
        assert!(intent.compound);
        assert_eq!(
            intent.secondary,
            vec![Action::Trivial { kind: TrivialKind::Look }]
        );
    }

    #[test]
    fn missing_primary_is_a_parse_failure() {
        assert!(matches!(
            intent_from_reply(&json!({ "confidence": 1.0 })),
            Err(ParserError::ParseFailed(_))
        ));
    }

    #[test]
    fn unknown_actions_pass_through() {
        let reply = json!({
            "primaryAction": { "action": "juggle", "target": "torches" },
            "confidence": 0.7,
        });
        let intent = intent_from_reply(&reply).unwrap();
        assert_eq!(intent.primary, Action::Unknown { raw: "juggle".into() });
    }
}
